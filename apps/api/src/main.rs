mod chat;
mod config;
mod documents;
mod errors;
mod extract;
mod llm_client;
mod routes;
mod sentiment;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::documents::acquire::DocumentFetcher;
use crate::llm_client::{GeminiClient, GenerativeProvider};
use crate::routes::{build_router, cors_layer};
use crate::sentiment::lexicon::LexiconAnalyzer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing GOOGLE_API_KEY)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={level},tower_http={level}",
                env!("CARGO_CRATE_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Insight API v{} (environment: {}, debug: {})",
        env!("CARGO_PKG_VERSION"),
        config.environment,
        config.is_development()
    );

    // Initialize LLM client
    let gemini = GeminiClient::new(&config)?;
    info!(
        "LLM client initialized (chat model: {}, document model: {})",
        gemini.chat_model(),
        gemini.document_model()
    );
    log_available_models(&gemini).await;

    let fetcher = DocumentFetcher::new(config.fetch_timeout())?;

    // Build app state
    let state = AppState {
        llm: Arc::new(gemini),
        sentiment: Arc::new(LexiconAnalyzer),
        fetcher,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Logs the models the API key can call. A failure here is not fatal.
async fn log_available_models(provider: &dyn GenerativeProvider) {
    match provider.list_models().await {
        Ok(models) => {
            info!("Available models ({}):", models.len());
            for model in models {
                info!("  {model}");
            }
        }
        Err(e) => warn!("Could not list available models: {e}"),
    }
}
