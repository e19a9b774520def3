use std::sync::Arc;

use crate::config::Config;
use crate::documents::acquire::DocumentFetcher;
use crate::llm_client::GenerativeProvider;
use crate::sentiment::SentimentAnalyzer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data; every field is either immutable or internally pooled.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable generative backend. Default: `GeminiClient`.
    pub llm: Arc<dyn GenerativeProvider>,
    /// Pluggable sentiment scorer. Default: `LexiconAnalyzer`.
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    /// HTTP client used to download PDFs by URL.
    pub fetcher: DocumentFetcher,
    pub config: Config,
}
