use chrono::Utc;
/// Unit tests for engagement-service core functionality
///
/// This test module covers:
/// - Notification type parsing and serialization
/// - Model serialization/deserialization
/// - Comment request validation
use engagement_service::error::AppError;
use engagement_service::handlers::engagement::CreateCommentRequest;
use engagement_service::models::*;
use uuid::Uuid;
use validator::Validate;

#[test]
fn test_notification_type_serialization() {
    let types = vec![
        NotificationType::Like,
        NotificationType::Comment,
        NotificationType::Follow,
    ];

    for notification_type in types {
        let json = serde_json::to_string(&notification_type).unwrap();
        let deserialized: NotificationType = serde_json::from_str(&json).unwrap();
        assert_eq!(notification_type, deserialized);
    }
}

#[test]
fn test_notification_type_as_str() {
    assert_eq!(NotificationType::Like.as_str(), "like");
    assert_eq!(NotificationType::Comment.as_str(), "comment");
    assert_eq!(NotificationType::Follow.as_str(), "follow");
}

#[test]
fn test_notification_type_parse_known_kinds() {
    assert_eq!(
        NotificationType::parse("like").unwrap(),
        NotificationType::Like
    );
    assert_eq!(
        NotificationType::parse("comment").unwrap(),
        NotificationType::Comment
    );
    assert_eq!(
        NotificationType::parse("follow").unwrap(),
        NotificationType::Follow
    );
}

#[test]
fn test_notification_type_parse_is_case_insensitive() {
    assert_eq!(
        NotificationType::parse("LIKE").unwrap(),
        NotificationType::Like
    );
    assert_eq!(
        NotificationType::parse("Follow").unwrap(),
        NotificationType::Follow
    );
}

#[test]
fn test_notification_type_parse_rejects_unknown() {
    for bad in ["mention", "system", "", "like "] {
        let err = NotificationType::parse(bad).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)), "{:?}", err);
    }
}

#[test]
fn test_comment_serialization_roundtrip() {
    let comment = Comment {
        id: Uuid::new_v4(),
        post_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        parent_id: None,
        content: "first!".to_string(),
        created_at: Utc::now(),
    };

    let json = serde_json::to_string(&comment).unwrap();
    let deserialized: Comment = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized.id, comment.id);
    assert_eq!(deserialized.parent_id, None);
    assert_eq!(deserialized.content, comment.content);
}

#[test]
fn test_comment_thread_carries_replies() {
    let top = Comment {
        id: Uuid::new_v4(),
        post_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        parent_id: None,
        content: "top".to_string(),
        created_at: Utc::now(),
    };
    let reply = Comment {
        id: Uuid::new_v4(),
        post_id: top.post_id,
        user_id: Uuid::new_v4(),
        parent_id: Some(top.id),
        content: "reply".to_string(),
        created_at: Utc::now(),
    };

    let thread = CommentThread::new(top.clone(), vec![reply.clone()]);

    assert_eq!(thread.id, top.id);
    assert_eq!(thread.replies.len(), 1);
    assert_eq!(thread.replies[0].parent_id, Some(top.id));
}

#[test]
fn test_notification_view_serializes_nested_context() {
    let view = NotificationView {
        id: Uuid::new_v4(),
        notification_type: NotificationType::Comment,
        is_read: false,
        created_at: Utc::now(),
        sender: UserSummary {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            avatar_url: None,
        },
        post: Some(PostSummary {
            id: Uuid::new_v4(),
            caption: Some("sunset".to_string()),
        }),
        comment: None,
    };

    let json: serde_json::Value = serde_json::to_value(&view).unwrap();
    assert_eq!(json["notification_type"], "comment");
    assert_eq!(json["sender"]["username"], "alice");
    assert_eq!(json["post"]["caption"], "sunset");
    assert!(json["comment"].is_null());
}

#[test]
fn test_create_comment_request_validation() {
    let ok = CreateCommentRequest {
        content: "looks great".to_string(),
    };
    assert!(ok.validate().is_ok());

    let empty = CreateCommentRequest {
        content: String::new(),
    };
    assert!(empty.validate().is_err());

    let at_limit = CreateCommentRequest {
        content: "x".repeat(1000),
    };
    assert!(at_limit.validate().is_ok());

    let too_long = CreateCommentRequest {
        content: "x".repeat(1001),
    };
    assert!(too_long.validate().is_err());
}
