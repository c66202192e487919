/// Engagement handlers - HTTP endpoints for likes and comment threads
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::PaginationParams;
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::services::{CommentService, LikeService};

const DEFAULT_COMMENT_PAGE: i64 = 10;
const DEFAULT_REPLY_PAGE: i64 = 5;

/// Request body for creating a comment or reply
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "content must be 1-1000 characters"))]
    pub content: String,
}

/// Like a post
///
/// POST /api/v1/posts/{post_id}/like
pub async fn like_post(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let like_count = LikeService::new((**pool).clone())
        .like_post(post_id, auth.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post liked successfully",
        "like_count": like_count,
    })))
}

/// Unlike a post
///
/// POST /api/v1/posts/{post_id}/unlike
pub async fn unlike_post(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let like_count = LikeService::new((**pool).clone())
        .unlike_post(post_id, auth.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post unliked successfully",
        "like_count": like_count,
    })))
}

/// Create a top-level comment on a post
///
/// POST /api/v1/posts/{post_id}/comments
pub async fn create_comment(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    auth: AuthenticatedUser,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let post_id = path.into_inner();

    let comment = CommentService::new((**pool).clone())
        .create_comment(post_id, auth.user_id, &req.content, None)
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Reply to a comment. The reply lands on the parent comment's post.
///
/// POST /api/v1/comments/{comment_id}/reply
pub async fn reply_to_comment(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    auth: AuthenticatedUser,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let parent_id = path.into_inner();

    // The post id is resolved from the parent inside the service; Uuid::nil
    // is a placeholder that is never used for a reply.
    let comment = CommentService::new((**pool).clone())
        .create_comment(Uuid::nil(), auth.user_id, &req.content, Some(parent_id))
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Page of top-level comments with nested replies, newest-first
///
/// GET /api/v1/posts/{post_id}/comments?skip&limit
pub async fn list_post_comments(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let (skip, limit) = query.sanitize(DEFAULT_COMMENT_PAGE);

    let threads = CommentService::new((**pool).clone())
        .list_top_level(post_id, skip, limit)
        .await?;

    Ok(HttpResponse::Ok().json(threads))
}

/// Paginated replies to a comment, oldest-first, with total
///
/// GET /api/v1/comments/{comment_id}/replies?skip&limit
pub async fn list_comment_replies(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let comment_id = path.into_inner();
    let (skip, limit) = query.sanitize(DEFAULT_REPLY_PAGE);

    let page = CommentService::new((**pool).clone())
        .list_replies(comment_id, skip, limit)
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Delete a comment (owner, or any comment for admins)
///
/// DELETE /api/v1/comments/{comment_id}
pub async fn delete_comment(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    let comment_id = path.into_inner();

    CommentService::new((**pool).clone())
        .delete_comment(comment_id, auth.user_id, auth.is_admin)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Comment deleted successfully",
    })))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .route("/{post_id}/like", web::post().to(like_post))
            .route("/{post_id}/unlike", web::post().to(unlike_post))
            .route("/{post_id}/comments", web::post().to(create_comment))
            .route("/{post_id}/comments", web::get().to(list_post_comments)),
    )
    .service(
        web::scope("/comments")
            .route("/{comment_id}/reply", web::post().to(reply_to_comment))
            .route("/{comment_id}/replies", web::get().to(list_comment_replies))
            .route("/{comment_id}", web::delete().to(delete_comment)),
    );
}
