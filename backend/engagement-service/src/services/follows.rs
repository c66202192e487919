/// Follow graph - follow/unfollow edges plus the following-id lookups the
/// feed and story listings consume. No invariant here beyond uniqueness.
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, Result};
use crate::metrics;
use crate::models::{Follow, NotificationType, UserSummary};
use crate::services::NotificationService;

pub struct FollowService {
    pool: PgPool,
}

impl FollowService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Follow a user. The edge insert and the follow notification commit in
    /// one transaction.
    pub async fn follow_user(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        if follower_id == following_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let known_users: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE id = $1 OR id = $2
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&mut *tx)
        .await?;

        if known_users != 2 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let follow = match sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            RETURNING id, follower_id, following_id, created_at
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(follow) => follow,
            Err(err) if is_unique_violation(&err) => {
                return Err(AppError::Conflict(
                    "Already following this user".to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        NotificationService::dispatch(
            &mut *tx,
            following_id,
            follower_id,
            NotificationType::Follow,
            None,
            None,
        )
        .await?;

        tx.commit().await?;

        metrics::observe_engagement_action("follow");
        info!(%follower_id, %following_id, follow_id = %follow.id, "follow created");
        Ok(())
    }

    /// Unfollow a user. No notification.
    pub async fn unfollow_user(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1 AND following_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound(
                "Follow relationship not found".to_string(),
            ));
        }

        metrics::observe_engagement_action("unfollow");
        info!(%follower_id, %following_id, "follow removed");
        Ok(())
    }

    /// Users following `user_id`, newest edge first
    pub async fn get_followers(
        &self,
        user_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<UserSummary>> {
        let followers = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.avatar_url
            FROM users u
            JOIN follows f ON f.follower_id = u.id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC, f.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(followers)
    }

    /// Users `user_id` follows, newest edge first
    pub async fn get_following(
        &self,
        user_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<UserSummary>> {
        let following = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.avatar_url
            FROM users u
            JOIN follows f ON f.following_id = u.id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC, f.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(following)
    }
}
