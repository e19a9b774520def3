use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub const BANNER: &str = "Insight API is running! Available endpoints: \
    /chat, /stream, /compare-pdfs, /summarize-pdf, /sentiment";

/// GET /
pub async fn home_handler() -> &'static str {
    BANNER
}

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "insight-api",
        "environment": state.config.environment,
    }))
}
