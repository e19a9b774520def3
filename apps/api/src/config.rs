use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_DOCUMENT_MODEL: &str = "gemini-2.0-flash";

/// Application configuration loaded from environment variables.
/// Built once at startup and carried in `AppState`; fails fast if `GOOGLE_API_KEY` is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub gemini_api_base: String,
    /// Model used for `/chat`.
    pub chat_model: String,
    /// Model used for `/compare-pdfs` and `/summarize-pdf`.
    pub document_model: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub fetch_timeout_secs: u64,
    pub acquire_concurrency: usize,
    pub max_upload_bytes: usize,
    pub stream_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let default_log = if environment == "development" {
            "debug"
        } else {
            "info"
        };

        Ok(Config {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            chat_model: std::env::var("GEMINI_CHAT_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            document_model: std::env::var("GEMINI_DOCUMENT_MODEL")
                .unwrap_or_else(|_| DEFAULT_DOCUMENT_MODEL.to_string()),
            port: parse_env("PORT", 10000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| default_log.to_string()),
            environment,
            fetch_timeout_secs: parse_env("FETCH_TIMEOUT_SECS", 60)?,
            acquire_concurrency: parse_env("ACQUIRE_CONCURRENCY", 4)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?,
            stream_delay_ms: parse_env("STREAM_DELAY_MS", 500)?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn stream_delay(&self) -> Duration {
        Duration::from_millis(self.stream_delay_ms)
    }

    /// Configuration with the production defaults, pointed at `api_base`.
    #[cfg(test)]
    pub fn for_tests(api_base: &str) -> Self {
        Config {
            google_api_key: "test-key".to_string(),
            gemini_api_base: api_base.trim_end_matches('/').to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            document_model: DEFAULT_DOCUMENT_MODEL.to_string(),
            port: 10000,
            environment: "test".to_string(),
            rust_log: "info".to_string(),
            fetch_timeout_secs: 60,
            acquire_concurrency: 4,
            max_upload_bytes: 50 * 1024 * 1024,
            stream_delay_ms: 500,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
