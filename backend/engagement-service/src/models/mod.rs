use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Post entity. Owned by the content service; this service reads rows for
/// ownership checks and maintains the two denormalized counters.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub caption: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Like entity - represents a user liking a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Comment entity. `parent_id = None` marks a top-level comment; replies
/// carry their parent's id and are at most one level deep.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Follow edge - follower_id follows following_id
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Notification type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    /// User liked a post
    Like,
    /// User commented on a post (or replied to a comment)
    Comment,
    /// User started following
    Follow,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
            NotificationType::Follow => "follow",
        }
    }

    /// Parse a stored/user-supplied type name. Anything outside the three
    /// known kinds is an invalid argument.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.to_lowercase().as_str() {
            "like" => Ok(NotificationType::Like),
            "comment" => Ok(NotificationType::Comment),
            "follow" => Ok(NotificationType::Follow),
            other => Err(AppError::ValidationError(format!(
                "Invalid notification type: {}",
                other
            ))),
        }
    }
}

/// Notification entity. `user_id` is the recipient, `sender_id` the actor.
/// Rows are immutable except for the `is_read` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sender_id: Uuid,
    pub notification_type: NotificationType,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Read-side views
// ============================================================================

/// Minimal user projection for read-side expansion
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Minimal post projection embedded in notification listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub caption: Option<String>,
}

/// Minimal comment projection embedded in notification listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentSummary {
    pub id: Uuid,
    pub content: String,
}

/// Top-level comment annotated with its full reply list (oldest-first)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<Comment>,
}

impl CommentThread {
    pub fn new(comment: Comment, replies: Vec<Comment>) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            parent_id: comment.parent_id,
            content: comment.content,
            created_at: comment.created_at,
            replies,
        }
    }
}

/// One page of replies to a single comment, with the total independent of
/// the pagination window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyPage {
    pub replies: Vec<Comment>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

/// Notification with sender/post/comment context resolved via read-side
/// joins (no lazy loading across component boundaries)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub sender: UserSummary,
    pub post: Option<PostSummary>,
    pub comment: Option<CommentSummary>,
}
