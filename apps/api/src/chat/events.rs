use serde::{Deserialize, Serialize};

use crate::models::chat::Message;
use crate::models::webhook::WebhookChatMessage;

/// Events delivered over the realtime fan-out hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChatEvent {
    /// A new message was inserted into a room.
    MessageCreated { message: Message },

    /// An inbound webhook message (and its optional AI reply) was relayed
    /// onto the global feed.
    WebhookMessage {
        message: WebhookChatMessage,
        ai_response: Option<String>,
    },
}
