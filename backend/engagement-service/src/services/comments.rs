/// Comment tree manager - creates/reads/deletes comments with exactly one
/// level of nesting (top-level comment + replies) and keeps the post's
/// `comment_count` in step with its top-level comments.
use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{Comment, CommentThread, NotificationType, Post, ReplyPage};
use crate::services::NotificationService;

const COMMENT_COLUMNS: &str = "id, post_id, user_id, parent_id, content, created_at";

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a comment or a reply.
    ///
    /// When `parent_id` is set, the reply lands on the parent's post and the
    /// supplied `post_id` is ignored; a reply to a reply is rejected before
    /// any row is written. Only top-level comments move `comment_count`.
    /// The comment row, counter update, and notifications commit in one
    /// transaction.
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Comment> {
        let mut tx = self.pool.begin().await?;

        let parent = match parent_id {
            Some(pid) => {
                let parent = sqlx::query_as::<_, Comment>(&format!(
                    "SELECT {} FROM comments WHERE id = $1",
                    COMMENT_COLUMNS
                ))
                .bind(pid)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;

                if parent.parent_id.is_some() {
                    return Err(AppError::BadRequest(
                        "Cannot reply to a reply".to_string(),
                    ));
                }
                Some(parent)
            }
            None => None,
        };

        // Replies always land on their parent's post.
        let target_post_id = parent.as_ref().map(|p| p.post_id).unwrap_or(post_id);

        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, owner_id, caption, like_count, comment_count, created_at
            FROM posts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(target_post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (post_id, user_id, parent_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        ))
        .bind(target_post_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        if parent_id.is_none() {
            sqlx::query(
                r#"
                UPDATE posts
                SET comment_count = comment_count + 1
                WHERE id = $1
                "#,
            )
            .bind(target_post_id)
            .execute(&mut *tx)
            .await?;
        }

        // Post owner and parent author are notified independently; both can
        // fire for the same reply. The dispatcher suppresses self-actions.
        NotificationService::dispatch(
            &mut *tx,
            post.owner_id,
            user_id,
            NotificationType::Comment,
            Some(post.id),
            Some(comment.id),
        )
        .await?;

        if let Some(parent) = &parent {
            NotificationService::dispatch(
                &mut *tx,
                parent.user_id,
                user_id,
                NotificationType::Comment,
                Some(post.id),
                Some(comment.id),
            )
            .await?;
        }

        tx.commit().await?;

        let action = if parent_id.is_some() { "reply" } else { "comment" };
        metrics::observe_engagement_action(action);
        info!(post_id = %target_post_id, %user_id, comment_id = %comment.id, action, "comment created");
        Ok(comment)
    }

    /// Page of top-level comments newest-first, each annotated with its full
    /// reply list oldest-first. Replies for the whole page are fetched in a
    /// single pass.
    pub async fn list_top_level(
        &self,
        post_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<CommentThread>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {}
            FROM comments
            WHERE post_id = $1 AND parent_id IS NULL
            ORDER BY created_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
            COMMENT_COLUMNS
        ))
        .bind(post_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        let comment_ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();

        let replies = if comment_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, Comment>(&format!(
                r#"
                SELECT {}
                FROM comments
                WHERE parent_id = ANY($1)
                ORDER BY created_at ASC, id ASC
                "#,
                COMMENT_COLUMNS
            ))
            .bind(&comment_ids)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(group_replies(comments, replies))
    }

    /// Paginated replies to one comment, oldest-first, with the total reply
    /// count independent of the pagination window.
    pub async fn list_replies(
        &self,
        comment_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<ReplyPage> {
        let replies = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {}
            FROM comments
            WHERE parent_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM comments
            WHERE parent_id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ReplyPage {
            replies,
            total,
            skip,
            limit,
        })
    }

    /// Delete a comment.
    ///
    /// Admins may delete any comment; everyone else only their own. The
    /// ownership failure is collapsed into the not-found error so callers
    /// cannot probe for other users' comment ids. Deleting a top-level
    /// comment decrements `comment_count`; replies never touch it. Children
    /// of a deleted comment are left in place.
    pub async fn delete_comment(
        &self,
        comment_id: Uuid,
        requester_id: Uuid,
        is_admin: bool,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE id = $1 FOR UPDATE",
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(
                "Comment not found or you don't have permission to delete it".to_string(),
            )
        })?;

        if !is_admin && comment.user_id != requester_id {
            return Err(AppError::NotFound(
                "Comment not found or you don't have permission to delete it".to_string(),
            ));
        }

        if comment.parent_id.is_none() {
            sqlx::query(
                r#"
                UPDATE posts
                SET comment_count = comment_count - 1
                WHERE id = $1 AND comment_count > 0
                "#,
            )
            .bind(comment.post_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        metrics::observe_engagement_action("delete_comment");
        info!(%comment_id, %requester_id, is_admin, "comment deleted");
        Ok(())
    }
}

/// Group a reply list (already ordered oldest-first) under its page of
/// top-level comments, preserving both orders.
fn group_replies(comments: Vec<Comment>, replies: Vec<Comment>) -> Vec<CommentThread> {
    let mut by_parent: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id {
            by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    comments
        .into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.id).unwrap_or_default();
            CommentThread::new(comment, replies)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn comment(parent_id: Option<Uuid>, offset_secs: i64) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            parent_id,
            content: "hello".to_string(),
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_group_replies_buckets_by_parent() {
        let top_a = comment(None, 0);
        let top_b = comment(None, 1);
        let reply_a1 = comment(Some(top_a.id), 2);
        let reply_a2 = comment(Some(top_a.id), 3);
        let reply_b1 = comment(Some(top_b.id), 4);

        let threads = group_replies(
            vec![top_b.clone(), top_a.clone()],
            vec![reply_a1.clone(), reply_a2.clone(), reply_b1.clone()],
        );

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, top_b.id);
        assert_eq!(threads[0].replies.len(), 1);
        assert_eq!(threads[0].replies[0].id, reply_b1.id);
        assert_eq!(threads[1].id, top_a.id);
        assert_eq!(
            threads[1].replies.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![reply_a1.id, reply_a2.id]
        );
    }

    #[test]
    fn test_group_replies_preserves_reply_order() {
        let top = comment(None, 0);
        let first = comment(Some(top.id), 1);
        let second = comment(Some(top.id), 2);
        let third = comment(Some(top.id), 3);

        let threads = group_replies(
            vec![top],
            vec![first.clone(), second.clone(), third.clone()],
        );

        assert_eq!(
            threads[0].replies.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![first.id, second.id, third.id]
        );
    }

    #[test]
    fn test_group_replies_with_no_replies() {
        let top = comment(None, 0);
        let threads = group_replies(vec![top.clone()], Vec::new());

        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, top.id);
        assert!(threads[0].replies.is_empty());
    }

    #[test]
    fn test_group_replies_drops_orphans_outside_page() {
        let top = comment(None, 0);
        let stray = comment(Some(Uuid::new_v4()), 1);

        let threads = group_replies(vec![top], vec![stray]);
        assert!(threads[0].replies.is_empty());
    }
}
