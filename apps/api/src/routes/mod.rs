pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::relay;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat API
        .route(
            "/api/v1/chat/rooms",
            get(chat::list_rooms).post(chat::create_room),
        )
        .route(
            "/api/v1/chat/rooms/:id/messages",
            get(chat::room_messages).post(chat::send_message),
        )
        .route("/api/v1/chat/rooms/:id/ws", get(chat::room_ws))
        .route("/api/v1/chat/feed/ws", get(chat::feed_ws))
        // Relay functions (platform function mount point)
        .route("/functions/v1/chatbot", post(relay::chatbot::handle_chatbot))
        .route(
            "/functions/v1/resume-scanner",
            post(relay::scanner::handle_resume_scan),
        )
        .route(
            "/functions/v1/chat-webhook",
            post(relay::webhook::handle_webhook_post).get(relay::webhook::handle_webhook_get),
        )
        .with_state(state)
}
