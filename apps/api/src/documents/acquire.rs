//! File acquisition: turns a compare/summarize request body into uploaded `FileRef`s.
//!
//! Two input modes:
//! 1. `application/json` with `{ "pdf_urls": [...] }`, each URL is downloaded.
//! 2. `multipart/form-data` with one or more `files` parts, read into memory.
//!
//! Downloads and uploads fan out with bounded concurrency; results keep input order and
//! the first failure aborts the whole request.

use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header,
    Json,
};
use bytes::Bytes;
use futures::{stream, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::FileRef;
use crate::state::AppState;

/// Multipart field name carrying the uploaded PDFs.
pub const FILES_FIELD: &str = "files";
pub const PDF_MIME_TYPE: &str = "application/pdf";
const NO_INPUT_MESSAGE: &str = "Provide PDF URLs in JSON or upload files";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Transport { url, .. } => url,
        }
    }
}

/// Downloads remote PDFs with a per-request timeout.
#[derive(Clone)]
pub struct DocumentFetcher {
    client: Client,
}

impl DocumentFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Fetches the full body of `url`. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!(url, bytes = body.len(), "Fetched document");
        Ok(body)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PdfUrlsRequest {
    #[serde(default)]
    pub pdf_urls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UploadedPdf {
    pub file_name: String,
    pub data: Bytes,
}

/// The resolved input mode of a document request.
#[derive(Debug)]
pub enum PdfInput {
    Urls(Vec<String>),
    Uploads(Vec<UploadedPdf>),
}

impl PdfInput {
    pub fn len(&self) -> usize {
        match self {
            PdfInput::Urls(urls) => urls.len(),
            PdfInput::Uploads(files) => files.len(),
        }
    }

    /// Fails with `BadRequest` when fewer than `min` inputs were supplied.
    pub fn require_at_least(&self, min: usize) -> Result<(), AppError> {
        if self.len() >= min {
            return Ok(());
        }
        let plural = if min == 1 { "" } else { "s" };
        let message = match self {
            PdfInput::Urls(_) => format!("Provide at least {min} PDF URL{plural}"),
            PdfInput::Uploads(_) => format!("Upload at least {min} PDF file{plural}"),
        };
        Err(AppError::BadRequest(message))
    }
}

#[async_trait]
impl<S> FromRequest<S> for PdfInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<PdfUrlsRequest>::from_request(req, state).await?;
            return Ok(PdfInput::Urls(body.pdf_urls));
        }

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state).await?;
            let mut uploads = Vec::new();
            let mut saw_files_field = false;

            while let Some(field) = multipart.next_field().await? {
                if field.name() != Some(FILES_FIELD) {
                    continue;
                }
                saw_files_field = true;
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                uploads.push(UploadedPdf { file_name, data });
            }

            if saw_files_field {
                return Ok(PdfInput::Uploads(uploads));
            }
        }

        Err(AppError::BadRequest(NO_INPUT_MESSAGE.to_string()))
    }
}

enum Source {
    Url(String),
    Upload(UploadedPdf),
}

/// Validates the input count, then downloads (if needed) and uploads every PDF to the provider.
/// The returned references are in input order.
pub async fn acquire_file_refs(
    state: &AppState,
    input: PdfInput,
    min_count: usize,
) -> Result<Vec<FileRef>, AppError> {
    input.require_at_least(min_count)?;

    let sources: Vec<Source> = match input {
        PdfInput::Urls(urls) => urls.into_iter().map(Source::Url).collect(),
        PdfInput::Uploads(files) => files.into_iter().map(Source::Upload).collect(),
    };
    let concurrency = state.config.acquire_concurrency.max(1);

    stream::iter(sources.into_iter().enumerate())
        .map(|(index, source)| upload_one(state, index, source))
        .buffered(concurrency)
        .try_collect()
        .await
}

async fn upload_one(state: &AppState, index: usize, source: Source) -> Result<FileRef, AppError> {
    let (display_name, data) = match source {
        Source::Url(url) => {
            let data = state.fetcher.fetch(&url).await?;
            (display_name_from_url(&url, index), data)
        }
        Source::Upload(file) => {
            let name = if file.file_name.is_empty() {
                fallback_name(index)
            } else {
                file.file_name
            };
            (name, file.data)
        }
    };

    Ok(state
        .llm
        .upload_file(data, PDF_MIME_TYPE, &display_name)
        .await?)
}

fn display_name_from_url(url: &str, index: usize) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.trim_end_matches('/').rsplit('/').next())
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .map(str::to_string)
        .unwrap_or_else(|| fallback_name(index))
}

fn fallback_name(index: usize) -> String {
    format!("document-{}.pdf", index + 1)
}
