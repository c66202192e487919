pub mod comments;
pub mod follows;
pub mod likes;
pub mod notifications;

pub use comments::CommentService;
pub use follows::FollowService;
pub use likes::LikeService;
pub use notifications::NotificationService;
