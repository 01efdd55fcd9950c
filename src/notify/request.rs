use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page a comment belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    /// Site identifier
    pub site: String,
    /// Page URL
    pub url: String,
}

/// Author of a comment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Comment as received from the comment store on creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID
    pub id: String,
    #[serde(default)]
    pub locator: Locator,
    #[serde(default)]
    pub user: User,
    /// Rendered comment text
    #[serde(default)]
    pub text: String,
    /// ID of the comment this one replies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Creation time as recorded by the store
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Stamped with the current time, same as a payload without `timestamp`
impl Default for Comment {
    fn default() -> Self {
        Self {
            id: String::new(),
            locator: Locator::default(),
            user: User::default(),
            text: String::new(),
            parent_id: None,
            timestamp: Utc::now(),
        }
    }
}

impl Comment {
    /// Create a comment carrying only an ID
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Whether the comment is a reply
    pub fn is_reply(&self) -> bool {
        self.parent_id.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// A notification waiting to be fanned out to destinations.
///
/// Built once at submission and never mutated afterwards. The worker shares a
/// single instance read-only between all destination sends of one fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRequest {
    /// Unique identifier for this notification
    pub id: Uuid,
    /// The comment that triggered the notification
    pub comment: Comment,
    /// When the request was submitted
    pub submitted_at: DateTime<Utc>,
}

impl NotificationRequest {
    pub fn new(comment: Comment) -> Self {
        Self {
            id: Uuid::new_v4(),
            comment,
            submitted_at: Utc::now(),
        }
    }
}

impl From<Comment> for NotificationRequest {
    fn from(comment: Comment) -> Self {
        Self::new(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_deserialize_minimal() {
        let comment: Comment = serde_json::from_str(r#"{"id": "c-1"}"#).unwrap();
        assert_eq!(comment.id, "c-1");
        assert!(comment.text.is_empty());
        assert!(!comment.is_reply());
    }

    #[test]
    fn test_comment_is_reply() {
        let mut comment = Comment::with_id("c-2");
        comment.parent_id = Some(String::new());
        assert!(!comment.is_reply());

        comment.parent_id = Some("c-1".to_string());
        assert!(comment.is_reply());
    }

    #[test]
    fn test_requests_get_distinct_ids() {
        let comment = Comment::with_id("1");
        let a = NotificationRequest::new(comment.clone());
        let b = NotificationRequest::new(comment);
        assert_ne!(a.id, b.id);
        assert_eq!(a.comment, b.comment);
    }

    #[test]
    fn test_default_timestamp_matches_missing_field() {
        let before = Utc::now();
        let parsed: Comment = serde_json::from_str(r#"{"id": "c-3"}"#).unwrap();
        let built = Comment::default();

        assert!(parsed.timestamp >= before);
        assert!(built.timestamp >= before);
    }
}
