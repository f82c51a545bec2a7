//! API error types mapped to HTTP status codes.
//!
//! Each [`ApiError`] variant maps to a specific HTTP status code and produces
//! a short `text/plain` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reviewlens_core::StoreError;

/// Application-level error type that implements `IntoResponse`.
///
/// Each variant maps to an HTTP status code:
/// - `BadRequest` → 400
/// - `NotFound` → 404
/// - `Internal` → 500
#[derive(Debug)]
pub enum ApiError {
    /// Invalid or missing request fields (400).
    BadRequest(String),
    /// Resource not found (404).
    NotFound(String),
    /// Unexpected server error (500).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, message).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::error!("Review store failure: {}", other);
                ApiError::Internal(format!("Failed to persist review: {}", other))
            }
        }
    }
}
