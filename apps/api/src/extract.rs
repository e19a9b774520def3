use axum::extract::FromRequest;

use crate::errors::AppError;

/// `Json` extractor whose rejections render as `AppError::BadRequest`,
/// so malformed bodies get the same `{ "error": ... }` shape as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
