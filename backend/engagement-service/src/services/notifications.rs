/// Notification dispatcher - records notification rows as a side effect of
/// engagement actions and serves the read side (listing, read state).
///
/// `dispatch` is the single write path. The self-action check lives here,
/// not at call sites: a sender can never notify themselves, whatever the
/// caller does.
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{
    CommentSummary, Notification, NotificationType, NotificationView, PostSummary, UserSummary,
};

/// Flat row used for notification reads; the stored type string is parsed
/// back into `NotificationType` on the way out.
#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    sender_id: Uuid,
    notification_type: String,
    post_id: Option<Uuid>,
    comment_id: Option<Uuid>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> Result<Notification> {
        Ok(Notification {
            id: self.id,
            user_id: self.user_id,
            sender_id: self.sender_id,
            notification_type: NotificationType::parse(&self.notification_type)?,
            post_id: self.post_id,
            comment_id: self.comment_id,
            is_read: self.is_read,
            created_at: self.created_at,
        })
    }
}

/// Joined row backing `NotificationView`; sender is always present, post
/// and comment context may have been deleted since the row was written.
#[derive(sqlx::FromRow)]
struct NotificationViewRow {
    id: Uuid,
    notification_type: String,
    is_read: bool,
    created_at: DateTime<Utc>,
    sender_id: Uuid,
    sender_username: String,
    sender_avatar_url: Option<String>,
    post_id: Option<Uuid>,
    post_caption: Option<String>,
    comment_id: Option<Uuid>,
    comment_content: Option<String>,
}

pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a notification inside the caller's transaction.
    ///
    /// Takes a `PgConnection` so the row commits or rolls back together
    /// with the engagement row and counter update that triggered it.
    /// Returns `Ok(None)` without writing when the sender and recipient
    /// coincide (self-actions never notify).
    pub async fn dispatch(
        conn: &mut PgConnection,
        recipient_id: Uuid,
        sender_id: Uuid,
        notification_type: NotificationType,
        post_id: Option<Uuid>,
        comment_id: Option<Uuid>,
    ) -> Result<Option<Notification>> {
        if recipient_id == sender_id {
            debug!(
                %sender_id,
                notification_type = notification_type.as_str(),
                "suppressing self-notification"
            );
            return Ok(None);
        }

        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (user_id, sender_id, notification_type, post_id, comment_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, sender_id, notification_type, post_id, comment_id,
                      is_read, created_at
            "#,
        )
        .bind(recipient_id)
        .bind(sender_id)
        .bind(notification_type.as_str())
        .bind(post_id)
        .bind(comment_id)
        .fetch_one(&mut *conn)
        .await?;

        metrics::observe_notification_created(notification_type.as_str());
        Ok(Some(row.into_notification()?))
    }

    /// List a user's notifications newest-first with sender/post/comment
    /// context resolved in one pass of explicit joins.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<NotificationView>> {
        let rows = sqlx::query_as::<_, NotificationViewRow>(
            r#"
            SELECT n.id, n.notification_type, n.is_read, n.created_at,
                   u.id AS sender_id, u.username AS sender_username,
                   u.avatar_url AS sender_avatar_url,
                   p.id AS post_id, p.caption AS post_caption,
                   c.id AS comment_id, c.content AS comment_content
            FROM notifications n
            JOIN users u ON u.id = n.sender_id
            LEFT JOIN posts p ON p.id = n.post_id
            LEFT JOIN comments c ON c.id = n.comment_id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC, n.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<NotificationView> {
                Ok(NotificationView {
                    id: row.id,
                    notification_type: NotificationType::parse(&row.notification_type)?,
                    is_read: row.is_read,
                    created_at: row.created_at,
                    sender: UserSummary {
                        id: row.sender_id,
                        username: row.sender_username,
                        avatar_url: row.sender_avatar_url,
                    },
                    post: row.post_id.map(|id| PostSummary {
                        id,
                        caption: row.post_caption.clone(),
                    }),
                    comment: match (row.comment_id, row.comment_content) {
                        (Some(id), Some(content)) => Some(CommentSummary { id, content }),
                        _ => None,
                    },
                })
            })
            .collect()
    }

    /// Flip one notification to read. Idempotent: marking an already-read
    /// notification again is a no-op success.
    pub async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }

        Ok(())
    }

    /// Flip every unread notification for the user; returns how many rows
    /// changed (zero is a valid outcome).
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Count unread notifications for the user
    pub async fn count_unread(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
