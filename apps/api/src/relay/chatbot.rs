//! Chatbot relay — wraps one generation call around a fixed persona prompt
//! and a short conversation window.
//!
//! Failure contract: the caller ALWAYS receives `{response}` — on any
//! failure the body is a fixed apology with status 500, so clients never
//! branch on payload shape (and never learn the failure reason).

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::llm_client::{GenerationParams, Part};
use crate::relay::prompts::CHATBOT_PROMPT_TEMPLATE;
use crate::state::AppState;

const CHATBOT_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    top_k: 40,
    top_p: 0.95,
    max_output_tokens: 1024,
};

/// How many trailing history entries are rendered into the prompt.
const MAX_HISTORY_MESSAGES: usize = 5;

/// Fixed failure reply. Byte-exact: clients display it verbatim.
pub const CHATBOT_APOLOGY: &str = "I'm sorry, I'm having trouble responding right now. Please try again later or contact support for assistance with your career questions.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub is_bot: bool,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatbotResponse {
    pub response: String,
}

/// POST /functions/v1/chatbot
pub async fn handle_chatbot(
    State(state): State<AppState>,
    Json(req): Json<ChatbotRequest>,
) -> (StatusCode, Json<ChatbotResponse>) {
    let prompt = build_prompt(&req.message, &req.conversation_history);

    match state.llm.generate(vec![Part::text(prompt)], CHATBOT_PARAMS).await {
        Ok(text) => (StatusCode::OK, Json(ChatbotResponse { response: text })),
        Err(e) => {
            error!("Error in chatbot relay: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatbotResponse {
                    response: CHATBOT_APOLOGY.to_string(),
                }),
            )
        }
    }
}

fn build_prompt(message: &str, history: &[HistoryEntry]) -> String {
    let start = history.len().saturating_sub(MAX_HISTORY_MESSAGES);
    let context = history[start..]
        .iter()
        .map(|entry| {
            let role = if entry.is_bot { "Assistant" } else { "User" };
            format!("{role}: {}", entry.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    CHATBOT_PROMPT_TEMPLATE
        .replace("{conversation_context}", &context)
        .replace("{message}", message)
}
