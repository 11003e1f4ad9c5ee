//! Row types for the chat store: rooms, messages, and sender profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Display-name label used when a sender has no profile row.
pub const UNKNOWN_SENDER: &str = "Unknown User";

/// A named channel grouping an ordered sequence of messages.
/// Immutable once referenced by messages.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRoom {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

/// A stored chat message. Append-only: there is no edit or delete path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    /// Currently always `"text"`.
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// Sender identity projection, looked up to decorate messages for display.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// A message joined with its sender's profile for display.
#[derive(Debug, Clone, Serialize)]
pub struct DecoratedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
}

impl DecoratedMessage {
    /// Absence of a profile degrades to a generic label, never a hard failure.
    pub fn new(message: Message, profile: Option<&Profile>) -> Self {
        let sender_name = profile
            .and_then(|p| p.display_name.clone())
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
        let sender_avatar = profile.and_then(|p| p.avatar_url.clone());
        Self {
            message,
            sender_name,
            sender_avatar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            body: "hello".to_string(),
            kind: "text".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_decorated_message_uses_profile_display_name() {
        let msg = message();
        let profile = Profile {
            user_id: msg.sender_id,
            display_name: Some("Sarah Johnson".to_string()),
            avatar_url: Some("https://cdn.example/avatar.png".to_string()),
        };
        let decorated = DecoratedMessage::new(msg, Some(&profile));
        assert_eq!(decorated.sender_name, "Sarah Johnson");
        assert_eq!(
            decorated.sender_avatar.as_deref(),
            Some("https://cdn.example/avatar.png")
        );
    }

    #[test]
    fn test_decorated_message_degrades_to_unknown_user() {
        let decorated = DecoratedMessage::new(message(), None);
        assert_eq!(decorated.sender_name, UNKNOWN_SENDER);
        assert!(decorated.sender_avatar.is_none());
    }

    #[test]
    fn test_decorated_message_profile_without_name_degrades() {
        let msg = message();
        let profile = Profile {
            user_id: msg.sender_id,
            display_name: None,
            avatar_url: None,
        };
        let decorated = DecoratedMessage::new(msg, Some(&profile));
        assert_eq!(decorated.sender_name, UNKNOWN_SENDER);
    }
}
