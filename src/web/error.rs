//! Web error types for the snapmark host.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::bookmark::BookmarkError;

/// Error type for web API operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with validation error.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict error (e.g., bookmarking turned off).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bookmark storage could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", Some(msg.clone())),
            WebError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad Request", Some(msg.clone()))
            }
            WebError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            WebError::Unavailable(msg) => {
                tracing::error!("Bookmark storage unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable",
                    Some(msg.clone()),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<BookmarkError> for WebError {
    fn from(err: BookmarkError) -> Self {
        match err {
            BookmarkError::Parse(_) | BookmarkError::Unencodable { .. } => {
                WebError::BadRequest(err.to_string())
            }
            BookmarkError::NotFound(_) => WebError::NotFound(err.to_string()),
            BookmarkError::StorageUnavailable(_) => WebError::Unavailable(err.to_string()),
            BookmarkError::Disabled => WebError::Conflict(err.to_string()),
        }
    }
}
