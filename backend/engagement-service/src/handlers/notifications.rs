/// Notification handlers - HTTP endpoints for the notification read side
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use super::PaginationParams;
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::services::NotificationService;

const DEFAULT_NOTIFICATION_PAGE: i64 = 10;

/// List the caller's notifications newest-first, with sender/post/comment
/// context expanded.
///
/// GET /api/v1/notifications?skip&limit
pub async fn list_notifications(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let (skip, limit) = query.sanitize(DEFAULT_NOTIFICATION_PAGE);

    let notifications = NotificationService::new((**pool).clone())
        .list_for_user(auth.user_id, skip, limit)
        .await?;

    Ok(HttpResponse::Ok().json(notifications))
}

/// Mark one notification as read (idempotent)
///
/// POST /api/v1/notifications/{notification_id}/read
pub async fn mark_as_read(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    let notification_id = path.into_inner();

    NotificationService::new((**pool).clone())
        .mark_read(notification_id, auth.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Notification marked as read",
    })))
}

/// Mark every unread notification as read; reports how many changed
///
/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    let marked = NotificationService::new((**pool).clone())
        .mark_all_read(auth.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "marked_read": marked,
    })))
}

/// Count of the caller's unread notifications
///
/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    let count = NotificationService::new((**pool).clone())
        .count_unread(auth.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "unread_count": count,
    })))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("/read-all", web::post().to(mark_all_read))
            .route("/unread-count", web::get().to(unread_count))
            .route("/{notification_id}/read", web::post().to(mark_as_read)),
    );
}
