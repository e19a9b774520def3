//! Caller-supplied conversation history.
//!
//! The service keeps no session state; every `/chat` call replays the full history it is
//! given. Turns are validated here so a malformed history fails with 400 instead of an
//! opaque provider error.

use serde::Deserialize;

use crate::errors::AppError;
use crate::llm_client::{ChatTurn, Role};

/// A history entry as sent by clients: `{ role, parts: [...] }` or `{ role, text }`.
#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<HistoryPart>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A part is either a bare string or an object with a `text` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HistoryPart {
    Plain(String),
    Text { text: String },
}

impl HistoryPart {
    fn into_text(self) -> String {
        match self {
            HistoryPart::Plain(text) | HistoryPart::Text { text } => text,
        }
    }
}

fn parse_role(raw: &str) -> Option<Role> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "user" => Some(Role::User),
        "model" | "assistant" => Some(Role::Model),
        _ => None,
    }
}

/// Converts client history into provider turns, rejecting unknown roles and empty turns.
pub fn normalize_history(entries: Vec<HistoryEntry>) -> Result<Vec<ChatTurn>, AppError> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let role = parse_role(&entry.role).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "history[{index}]: unsupported role '{}'",
                    entry.role
                ))
            })?;

            let parts: Vec<String> = entry
                .parts
                .into_iter()
                .map(HistoryPart::into_text)
                .chain(entry.text)
                .filter(|text| !text.trim().is_empty())
                .collect();

            if parts.is_empty() {
                return Err(AppError::BadRequest(format!(
                    "history[{index}]: turn has no text"
                )));
            }

            Ok(ChatTurn { role, parts })
        })
        .collect()
}
