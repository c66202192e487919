/// HTTP handlers for engagement endpoints
///
/// This module contains handlers for:
/// - Engagement: like/unlike posts, comment threads and replies
/// - Notifications: listing, read state, unread count
/// - Follows: follow/unfollow and follower/following listings
pub mod engagement;
pub mod follows;
pub mod notifications;

use serde::Deserialize;

/// Offset/limit pagination query used across list endpoints
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
}

impl PaginationParams {
    /// Clamp to sane bounds: skip never negative, limit within 1..=100
    /// falling back to the endpoint's default.
    pub fn sanitize(&self, default_limit: i64) -> (i64, i64) {
        let skip = self.skip.max(0);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, 100);
        (skip, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_defaults() {
        let params = PaginationParams {
            skip: 0,
            limit: None,
        };
        assert_eq!(params.sanitize(10), (0, 10));
    }

    #[test]
    fn test_sanitize_clamps_limit() {
        let params = PaginationParams {
            skip: 5,
            limit: Some(1000),
        };
        assert_eq!(params.sanitize(10), (5, 100));

        let params = PaginationParams {
            skip: 5,
            limit: Some(0),
        };
        assert_eq!(params.sanitize(10), (5, 1));
    }

    #[test]
    fn test_sanitize_negative_skip() {
        let params = PaginationParams {
            skip: -3,
            limit: Some(20),
        };
        assert_eq!(params.sanitize(10), (0, 20));
    }
}
