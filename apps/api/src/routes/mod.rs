pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::chat::handlers as chat;
use crate::documents::handlers as documents;
use crate::sentiment::handlers as sentiment;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::home_handler))
        .route("/health", get(health::health_handler))
        // Documents
        .route("/compare-pdfs", post(documents::handle_compare_pdfs))
        .route("/summarize-pdf", post(documents::handle_summarize_pdf))
        // Conversation
        .route("/chat", post(chat::handle_chat))
        .route("/stream", post(chat::handle_stream))
        // Sentiment
        .route("/sentiment", post(sentiment::handle_sentiment))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Any origin; GET/POST/OPTIONS; `Content-Type` request header.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
