//! Axum route handlers for `/chat` and `/stream`.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    Json,
};
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chat::history::{normalize_history, HistoryEntry};
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

const DEFAULT_STREAM_MESSAGE: &str = "Hello";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub chat: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    #[serde(default = "default_stream_message")]
    pub chat: String,
}

fn default_stream_message() -> String {
    DEFAULT_STREAM_MESSAGE.to_string()
}

/// POST /chat
///
/// Replays the caller's history, then sends the new message. Nothing is stored between calls.
pub async fn handle_chat(
    State(state): State<AppState>,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let history = normalize_history(request.history)?;
    let text = state.llm.chat(&history, &request.chat).await?;
    Ok(Json(ChatResponse { text }))
}

/// POST /stream
///
/// Echoes the message back one whitespace-delimited token per SSE frame.
/// Dropping the response (client disconnect) stops the stream.
pub async fn handle_stream(
    State(state): State<AppState>,
    AppJson(request): AppJson<StreamRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let frames = echo_tokens(&request.chat, state.config.stream_delay())
        .map(|token| Ok(Event::default().data(token)));
    Sse::new(frames)
}

/// Lazily yields `"<token> "` for each word, sleeping `delay` before every token but the first.
pub fn echo_tokens(message: &str, delay: Duration) -> impl Stream<Item = String> {
    let tokens: Vec<String> = message.split_whitespace().map(str::to_string).collect();
    debug!(tokens = tokens.len(), "Starting echo stream");

    stream::iter(tokens.into_iter().enumerate()).then(move |(index, token)| async move {
        if index > 0 {
            tokio::time::sleep(delay).await;
        }
        format!("{token} ")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_echo_tokens_are_spaced_by_delay() {
        let delay = Duration::from_millis(500);
        let mut tokens = Box::pin(echo_tokens("a b c", delay));

        let mut seen = Vec::new();
        let mut last: Option<Instant> = None;
        while let Some(token) = tokens.next().await {
            let now = Instant::now();
            if let Some(previous) = last {
                assert!(now - previous >= delay);
            }
            last = Some(now);
            seen.push(token);
        }

        assert_eq!(seen, vec!["a ", "b ", "c "]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_echo_tokens_collapse_whitespace() {
        let tokens: Vec<String> = echo_tokens("  hello \n\t world  ", Duration::from_millis(500))
            .collect()
            .await;
        assert_eq!(tokens, vec!["hello ", "world "]);
    }

    #[tokio::test]
    async fn test_empty_message_yields_nothing() {
        let tokens: Vec<String> = echo_tokens("   ", Duration::from_millis(500))
            .collect()
            .await;
        assert!(tokens.is_empty());
    }
}
