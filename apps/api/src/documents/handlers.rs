//! Axum route handlers for the document endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::documents::acquire::{acquire_file_refs, PdfInput};
use crate::errors::AppError;
use crate::llm_client::prompts::{COMPARE_PROMPT, SUMMARIZE_PROMPT};
use crate::state::AppState;

const MIN_COMPARE_INPUTS: usize = 2;
const MIN_SUMMARIZE_INPUTS: usize = 1;

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// POST /compare-pdfs
///
/// Compares the key findings of two or more papers, answered as a table.
pub async fn handle_compare_pdfs(
    State(state): State<AppState>,
    input: PdfInput,
) -> Result<Json<CompareResponse>, AppError> {
    let files = acquire_file_refs(&state, input, MIN_COMPARE_INPUTS).await?;
    let result = state.llm.generate_from_files(&files, COMPARE_PROMPT).await?;
    Ok(Json(CompareResponse { result }))
}

/// POST /summarize-pdf
pub async fn handle_summarize_pdf(
    State(state): State<AppState>,
    input: PdfInput,
) -> Result<Json<SummaryResponse>, AppError> {
    let files = acquire_file_refs(&state, input, MIN_SUMMARIZE_INPUTS).await?;
    let summary = state
        .llm
        .generate_from_files(&files, SUMMARIZE_PROMPT)
        .await?;
    Ok(Json(SummaryResponse { summary }))
}
