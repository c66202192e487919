/// Like manager - toggles a user's like on a post and keeps the post's
/// denormalized `like_count` exact.
///
/// Every mutation runs in one transaction: the like row, the counter
/// rewrite, and the notification commit together or not at all. The post
/// row is locked up front (`FOR UPDATE`) so concurrent likers on the same
/// post serialize and the recount cannot turn into a lost update.
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, Result};
use crate::metrics;
use crate::models::{Like, NotificationType, Post};
use crate::services::NotificationService;

pub struct LikeService {
    pool: PgPool,
}

impl LikeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Like a post. Returns the post's like count after the write.
    ///
    /// Fails with `NotFound` when the post does not exist and `Conflict`
    /// when the (user, post) pair is already liked. The count is recomputed
    /// from live like rows rather than incremented, so prior drift heals on
    /// the next write.
    pub async fn like_post(&self, post_id: Uuid, user_id: Uuid) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, owner_id, caption, like_count, comment_count, created_at
            FROM posts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let already_liked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM likes
                WHERE user_id = $1 AND post_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_liked {
            return Err(AppError::Conflict("Post already liked".to_string()));
        }

        // Races that slip past the pre-check land on the unique index.
        let like = match sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (user_id, post_id)
            VALUES ($1, $2)
            RETURNING id, user_id, post_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(like) => like,
            Err(err) if is_unique_violation(&err) => {
                return Err(AppError::Conflict("Post already liked".to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let like_count = Self::recount(&mut tx, post_id).await?;

        NotificationService::dispatch(
            &mut *tx,
            post.owner_id,
            user_id,
            NotificationType::Like,
            Some(post_id),
            None,
        )
        .await?;

        tx.commit().await?;

        metrics::observe_engagement_action("like");
        info!(%post_id, %user_id, like_id = %like.id, like_count, "post liked");
        Ok(like_count)
    }

    /// Unlike a post. Returns the post's like count after the write.
    ///
    /// Fails with `NotFound` when no active like exists for the pair. No
    /// notification is generated for unlike.
    pub async fn unlike_post(&self, post_id: Uuid, user_id: Uuid) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        // A like row implies the post row (foreign key), so a missing post
        // means there is no like to remove.
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, owner_id, caption, like_count, comment_count, created_at
            FROM posts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Like not found".to_string()))?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM likes
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound("Like not found".to_string()));
        }

        let like_count = Self::recount(&mut tx, post_id).await?;

        tx.commit().await?;

        metrics::observe_engagement_action("unlike");
        info!(%post_id, %user_id, like_count, "post unliked");
        Ok(like_count)
    }

    /// Recompute `posts.like_count` from live like rows inside the caller's
    /// transaction and return the fresh value.
    async fn recount(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        post_id: Uuid,
    ) -> Result<i64> {
        let like_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM likes
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE posts
            SET like_count = $2
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(like_count)
        .execute(&mut **tx)
        .await?;

        Ok(like_count)
    }
}
