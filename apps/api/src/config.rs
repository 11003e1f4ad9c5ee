use anyhow::{Context, Result};

/// Fallback verification token used when `WEBHOOK_VERIFY_TOKEN` is not set.
pub const DEFAULT_WEBHOOK_VERIFY_TOKEN: &str = "your_verify_token";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Missing key is not a startup error: the relay functions report it
    /// per-request with their own failure shapes.
    pub gemini_api_key: Option<String>,
    pub webhook_verify_token: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            webhook_verify_token: std::env::var("WEBHOOK_VERIFY_TOKEN")
                .unwrap_or_else(|_| DEFAULT_WEBHOOK_VERIFY_TOKEN.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
