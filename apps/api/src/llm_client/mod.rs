//! LLM Client: the single point of entry for all Gemini API calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini REST API directly.
//! Handlers depend on the `GenerativeProvider` trait so tests can swap in a stub.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub mod prompts;
mod wire;

use wire::{
    Content, ErrorEnvelope, FileData, GenerateContentRequest, GenerateContentResponse,
    ListModelsResponse, Part, UploadFileResponse,
};

const API_VERSION: &str = "v1beta";
const PROVIDER_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content (finish reason: {0})")]
    EmptyContent(String),

    #[error("Upload session did not return an upload URL")]
    MissingUploadUrl,
}

/// Opaque handle to a blob uploaded to the provider. Only valid for the request that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One validated conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub parts: Vec<String>,
}

/// The generative backend used by the handlers.
///
/// Carried in `AppState` as `Arc<dyn GenerativeProvider>`.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Uploads a blob and returns a reference usable in a later generation call.
    async fn upload_file(
        &self,
        data: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<FileRef, LlmError>;

    /// Runs the document model over `files` followed by `instruction`.
    async fn generate_from_files(
        &self,
        files: &[FileRef],
        instruction: &str,
    ) -> Result<String, LlmError>;

    /// Sends `message` to the chat model after replaying `history`.
    async fn chat(&self, history: &[ChatTurn], message: &str) -> Result<String, LlmError>;

    /// Names of the models that support `generateContent`.
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;
}

/// Gemini REST client. Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    chat_model: String,
    document_model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: config.google_api_key.clone(),
            api_base: config.gemini_api_base.clone(),
            chat_model: config.chat_model.clone(),
            document_model: config.document_model.clone(),
        })
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn document_model(&self) -> &str {
        &self.document_model
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.api_base, API_VERSION, path)
    }

    async fn generate_content(
        &self,
        model: &str,
        contents: Vec<Content>,
    ) -> Result<String, LlmError> {
        let request_body = GenerateContentRequest { contents };

        debug!(
            model,
            turns = request_body.contents.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.url(&format!("models/{model}:generateContent")))
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let body = check_status(response).await?.text().await?;
        let response: GenerateContentResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "generateContent succeeded: input_tokens={}, output_tokens={}",
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0)
            );
        }

        response.text()
    }
}

#[async_trait]
impl GenerativeProvider for GeminiClient {
    async fn upload_file(
        &self,
        data: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<FileRef, LlmError> {
        // Resumable protocol: open a session, then send all bytes with a single finalize.
        let start = self
            .client
            .post(format!("{}/upload/{}/files", self.api_base, API_VERSION))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", data.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = check_status(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or(LlmError::MissingUploadUrl)?
            .to_string();

        let size = data.len();
        let response = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(data)
            .send()
            .await?;

        let uploaded: UploadFileResponse = check_status(response).await?.json().await?;

        debug!(
            name = %uploaded.file.name,
            bytes = size,
            "Uploaded file to Gemini"
        );

        Ok(FileRef {
            name: uploaded.file.name,
            uri: uploaded.file.uri,
            mime_type: uploaded
                .file
                .mime_type
                .unwrap_or_else(|| mime_type.to_string()),
        })
    }

    async fn generate_from_files(
        &self,
        files: &[FileRef],
        instruction: &str,
    ) -> Result<String, LlmError> {
        let mut parts: Vec<Part> = files
            .iter()
            .map(|f| Part::FileData {
                file_data: FileData {
                    mime_type: f.mime_type.clone(),
                    file_uri: f.uri.clone(),
                },
            })
            .collect();
        parts.push(Part::Text {
            text: instruction.to_string(),
        });

        let contents = vec![Content {
            role: Some(Role::User.as_str().to_string()),
            parts,
        }];

        self.generate_content(&self.document_model, contents).await
    }

    async fn chat(&self, history: &[ChatTurn], message: &str) -> Result<String, LlmError> {
        let mut contents: Vec<Content> = history.iter().map(Content::from).collect();
        contents.push(Content {
            role: Some(Role::User.as_str().to_string()),
            parts: vec![Part::Text {
                text: message.to_string(),
            }],
        });

        self.generate_content(&self.chat_model, contents).await
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.url("models"))
                .header("x-goog-api-key", &self.api_key)
                .query(&[("pageSize", "1000")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let listing: ListModelsResponse = check_status(response).await?.json().await?;

            names.extend(
                listing
                    .models
                    .into_iter()
                    .filter(|m| {
                        m.supported_generation_methods
                            .iter()
                            .any(|method| method == "generateContent")
                    })
                    .map(|m| m.name),
            );

            match listing.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = names.len(), "Listed models");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::Value;

    use super::*;
    use crate::test_support::spawn_server;

    #[derive(Clone, Default)]
    struct Recorded {
        base: Arc<Mutex<String>>,
        requests: Arc<Mutex<Vec<Value>>>,
        uploads: Arc<Mutex<Vec<(String, usize)>>>,
    }

    async fn start_upload(State(rec): State<Recorded>, headers: HeaderMap) -> impl IntoResponse {
        assert_eq!(headers["x-goog-upload-command"], "start");
        assert_eq!(headers["x-goog-api-key"], "test-key");
        let base = rec.base.lock().unwrap().clone();
        (
            [("x-goog-upload-url", format!("{base}/upload-session/1"))],
            StatusCode::OK,
        )
    }

    async fn finish_upload(
        State(rec): State<Recorded>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Json<Value> {
        let command = headers["x-goog-upload-command"].to_str().unwrap().to_string();
        rec.uploads.lock().unwrap().push((command, body.len()));
        Json(json!({
            "file": {
                "name": "files/abc123",
                "uri": "https://files.example/abc123",
                "mimeType": "application/pdf"
            }
        }))
    }

    async fn generate(
        State(rec): State<Recorded>,
        Path(call): Path<String>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        rec.requests.lock().unwrap().push(body.clone());
        let turns = body["contents"].as_array().map(Vec::len).unwrap_or(0);
        Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": format!("{call} with {turns} turns") },
                    { "text": " (done)" }
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 4 }
        }))
    }

    // Two pages, chained by `nextPageToken`.
    async fn list(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(params.get("pageSize").map(String::as_str), Some("1000"));
        match params.get("pageToken").map(String::as_str) {
            None => Json(json!({
                "models": [
                    { "name": "models/gemini-2.0-flash", "supportedGenerationMethods": ["generateContent", "countTokens"] },
                    { "name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"] }
                ],
                "nextPageToken": "page-2"
            })),
            Some("page-2") => Json(json!({
                "models": [
                    { "name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["generateContent"] }
                ],
                "nextPageToken": ""
            })),
            Some(other) => panic!("unexpected page token {other}"),
        }
    }

    async fn stub_gemini() -> (GeminiClient, Recorded) {
        let rec = Recorded::default();
        let router = Router::new()
            .route("/upload/v1beta/files", post(start_upload))
            .route("/upload-session/:id", post(finish_upload))
            .route("/v1beta/models/:call", post(generate))
            .route("/v1beta/models", get(list))
            .with_state(rec.clone());
        let base = spawn_server(router).await;
        *rec.base.lock().unwrap() = base.clone();
        let client = GeminiClient::new(&Config::for_tests(&base)).unwrap();
        (client, rec)
    }

    #[tokio::test]
    async fn test_upload_file_runs_resumable_session() {
        let (client, rec) = stub_gemini().await;

        let file = client
            .upload_file(Bytes::from_static(b"%PDF-1.4 body"), "application/pdf", "a.pdf")
            .await
            .unwrap();

        assert_eq!(file.name, "files/abc123");
        assert_eq!(file.uri, "https://files.example/abc123");
        assert_eq!(file.mime_type, "application/pdf");
        let uploads = rec.uploads.lock().unwrap().clone();
        assert_eq!(uploads, vec![("upload, finalize".to_string(), 13)]);
    }

    #[tokio::test]
    async fn test_generate_from_files_puts_files_before_instruction() {
        let (client, rec) = stub_gemini().await;
        let files = vec![
            FileRef {
                name: "files/1".into(),
                uri: "https://files.example/1".into(),
                mime_type: "application/pdf".into(),
            },
            FileRef {
                name: "files/2".into(),
                uri: "https://files.example/2".into(),
                mime_type: "application/pdf".into(),
            },
        ];

        let text = client
            .generate_from_files(&files, "Compare them.")
            .await
            .unwrap();

        assert_eq!(text, "gemini-2.0-flash:generateContent with 1 turns (done)");
        let request = rec.requests.lock().unwrap()[0].clone();
        let parts = request["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["fileData"]["fileUri"], "https://files.example/1");
        assert_eq!(parts[1]["fileData"]["fileUri"], "https://files.example/2");
        assert_eq!(parts[2]["text"], "Compare them.");
    }

    #[tokio::test]
    async fn test_chat_replays_history_then_message() {
        let (client, rec) = stub_gemini().await;
        let history = vec![
            ChatTurn {
                role: Role::User,
                parts: vec!["hello".into()],
            },
            ChatTurn {
                role: Role::Model,
                parts: vec!["hi there".into()],
            },
        ];

        let text = client.chat(&history, "how are you?").await.unwrap();

        assert!(text.starts_with("gemini-2.5-flash:generateContent with 3 turns"));
        let request = rec.requests.lock().unwrap()[0].clone();
        assert_eq!(request["contents"][1]["role"], "model");
        assert_eq!(request["contents"][1]["parts"][0]["text"], "hi there");
        assert_eq!(request["contents"][2]["role"], "user");
        assert_eq!(request["contents"][2]["parts"][0]["text"], "how are you?");
    }

    #[tokio::test]
    async fn test_list_models_follows_pages_and_keeps_generate_content_models() {
        let (client, _) = stub_gemini().await;
        let models = client.list_models().await.unwrap();
        assert_eq!(
            models,
            vec![
                "models/gemini-2.0-flash".to_string(),
                "models/gemini-2.5-flash".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_api_error_uses_envelope_message() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" } })),
                )
            }),
        );
        let base = spawn_server(router).await;
        let client = GeminiClient::new(&Config::for_tests(&base)).unwrap();

        let err = client.chat(&[], "hi").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
