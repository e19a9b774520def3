//! Shared fixtures for handler and client tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;

use crate::config::Config;
use crate::documents::acquire::DocumentFetcher;
use crate::llm_client::{ChatTurn, FileRef, GenerativeProvider, LlmError};
use crate::sentiment::lexicon::LexiconAnalyzer;
use crate::state::AppState;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// In-memory provider that records what the handlers send it.
#[derive(Default)]
pub struct StubProvider {
    pub uploads: Mutex<Vec<(String, Bytes)>>,
    pub chats: Mutex<Vec<(Vec<ChatTurn>, String)>>,
    pub fail_generation: bool,
}

impl StubProvider {
    pub fn failing() -> Self {
        Self {
            fail_generation: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl GenerativeProvider for StubProvider {
    async fn upload_file(
        &self,
        data: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<FileRef, LlmError> {
        self.uploads
            .lock()
            .unwrap()
            .push((display_name.to_string(), data));
        Ok(FileRef {
            name: format!("files/{display_name}"),
            uri: format!("stub://{display_name}"),
            mime_type: mime_type.to_string(),
        })
    }

    async fn generate_from_files(
        &self,
        files: &[FileRef],
        instruction: &str,
    ) -> Result<String, LlmError> {
        if self.fail_generation {
            return Err(LlmError::Api {
                status: 500,
                message: "upstream exploded".into(),
            });
        }
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        Ok(format!("[{}] {instruction}", names.join(", ")))
    }

    async fn chat(&self, history: &[ChatTurn], message: &str) -> Result<String, LlmError> {
        if self.fail_generation {
            return Err(LlmError::EmptyContent("SAFETY".into()));
        }
        self.chats
            .lock()
            .unwrap()
            .push((history.to_vec(), message.to_string()));
        Ok(format!("reply to '{message}' after {} turns", history.len()))
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        Ok(vec!["models/stub".to_string()])
    }
}

pub fn test_state(provider: Arc<StubProvider>) -> AppState {
    test_state_with_timeout(provider, Duration::from_secs(60))
}

pub fn test_state_with_timeout(provider: Arc<StubProvider>, fetch_timeout: Duration) -> AppState {
    let config = Config::for_tests("http://127.0.0.1:9");
    AppState {
        llm: provider,
        sentiment: Arc::new(LexiconAnalyzer),
        fetcher: DocumentFetcher::new(fetch_timeout).unwrap(),
        config,
    }
}
