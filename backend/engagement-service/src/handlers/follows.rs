/// Follow handlers - HTTP endpoints for the follow graph
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use super::PaginationParams;
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::services::FollowService;

const DEFAULT_FOLLOW_PAGE: i64 = 10;

/// Follow a user
///
/// POST /api/v1/users/{user_id}/follow
pub async fn follow_user(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    let following_id = path.into_inner();

    FollowService::new((**pool).clone())
        .follow_user(auth.user_id, following_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Now following user {}", following_id),
    })))
}

/// Unfollow a user
///
/// POST /api/v1/users/{user_id}/unfollow
pub async fn unfollow_user(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    let following_id = path.into_inner();

    FollowService::new((**pool).clone())
        .unfollow_user(auth.user_id, following_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Unfollowed user {}", following_id),
    })))
}

/// List a user's followers
///
/// GET /api/v1/users/{user_id}/followers?skip&limit
pub async fn list_followers(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let (skip, limit) = query.sanitize(DEFAULT_FOLLOW_PAGE);

    let followers = FollowService::new((**pool).clone())
        .get_followers(user_id, skip, limit)
        .await?;

    Ok(HttpResponse::Ok().json(followers))
}

/// List who a user follows
///
/// GET /api/v1/users/{user_id}/following?skip&limit
pub async fn list_following(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let (skip, limit) = query.sanitize(DEFAULT_FOLLOW_PAGE);

    let following = FollowService::new((**pool).clone())
        .get_following(user_id, skip, limit)
        .await?;

    Ok(HttpResponse::Ok().json(following))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/{user_id}/follow", web::post().to(follow_user))
            .route("/{user_id}/unfollow", web::post().to(unfollow_user))
            .route("/{user_id}/followers", web::get().to(list_followers))
            .route("/{user_id}/following", web::get().to(list_following)),
    );
}
