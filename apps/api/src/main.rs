mod chat;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod relay;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::realtime::ChatHub;
use crate::chat::store::{ChatStore, PgChatStore};
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PlacementPro API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Gemini client
    let llm = GeminiClient::new(config.gemini_api_key.clone());
    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; relay functions will answer with fallbacks");
    }
    info!("Gemini client initialized (model: {})", llm_client::MODEL);

    // Realtime fan-out hub
    let hub = ChatHub::new();

    // Message store
    let store: Arc<dyn ChatStore> = Arc::new(PgChatStore::new(db.clone()));

    // Build app state
    let state = AppState {
        db,
        store,
        hub,
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
