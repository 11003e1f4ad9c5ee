//! The inbound-webhook message record.
//!
//! Deliberately a separate storage target from `models::chat`: the webhook
//! path accepts arbitrary external senders, so `user_id` is an opaque string
//! with no referential integrity against rooms or profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sender label applied when the webhook payload names none.
pub const WEBHOOK_SENDER: &str = "webhook";

/// A webhook chat message as stored and as echoed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookChatMessage {
    pub user_id: Option<String>,
    pub message: String,
    pub sender: String,
    pub created_at: DateTime<Utc>,
    pub metadata: Value,
}

impl WebhookChatMessage {
    /// Builds the stored record from an inbound payload, applying defaults:
    /// missing sender becomes `"webhook"`, an unparseable or missing
    /// timestamp becomes `now`, missing metadata becomes `{}`.
    pub fn from_payload(
        user_id: Option<String>,
        message: String,
        sender: Option<String>,
        timestamp: Option<String>,
        metadata: Option<Value>,
    ) -> Self {
        let created_at = timestamp
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Self {
            user_id,
            message,
            sender: sender.unwrap_or_else(|| WEBHOOK_SENDER.to_string()),
            created_at,
            metadata: metadata.unwrap_or_else(|| Value::Object(Default::default())),
        }
    }

    /// Whether this message should be run through the AI relay.
    /// Only an explicit `"processWithAI": false` opts out.
    pub fn process_with_ai(&self) -> bool {
        self.metadata
            .get("processWithAI")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_applied_for_bare_payload() {
        let msg = WebhookChatMessage::from_payload(None, "ping".to_string(), None, None, None);
        assert_eq!(msg.sender, WEBHOOK_SENDER);
        assert!(msg.user_id.is_none());
        assert_eq!(msg.metadata, json!({}));
    }

    #[test]
    fn test_valid_timestamp_is_preserved() {
        let msg = WebhookChatMessage::from_payload(
            None,
            "ping".to_string(),
            None,
            Some("2024-05-01T10:30:00Z".to_string()),
            None,
        );
        assert_eq!(msg.created_at.to_rfc3339(), "2024-05-01T10:30:00+00:00");
    }

    #[test]
    fn test_garbage_timestamp_falls_back_to_now() {
        let before = Utc::now();
        let msg = WebhookChatMessage::from_payload(
            None,
            "ping".to_string(),
            None,
            Some("next tuesday".to_string()),
            None,
        );
        assert!(msg.created_at >= before);
    }

    #[test]
    fn test_process_with_ai_defaults_to_true() {
        let msg = WebhookChatMessage::from_payload(None, "ping".to_string(), None, None, None);
        assert!(msg.process_with_ai());

        let tagged = WebhookChatMessage::from_payload(
            None,
            "ping".to_string(),
            None,
            None,
            Some(json!({"source": "crm"})),
        );
        assert!(tagged.process_with_ai());
    }

    #[test]
    fn test_process_with_ai_explicit_false_opts_out() {
        let msg = WebhookChatMessage::from_payload(
            None,
            "ping".to_string(),
            None,
            None,
            Some(json!({"processWithAI": false})),
        );
        assert!(!msg.process_with_ai());
    }

    #[test]
    fn test_process_with_ai_non_bool_value_is_ignored() {
        let msg = WebhookChatMessage::from_payload(
            None,
            "ping".to_string(),
            None,
            None,
            Some(json!({"processWithAI": "no"})),
        );
        assert!(msg.process_with_ai());
    }
}
