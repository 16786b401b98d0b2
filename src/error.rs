//! Error types for the API client and gateway
//!
//! Provides unified error handling using thiserror. The cache itself has no
//! error channel; these cover upstream fetches and gateway requests.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Api Error Enum ==
/// Unified error type for upstream calls and gateway handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure talking to the upstream
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream payload did not match the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upstream answered with a non-success status
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status the gateway answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Http(_) | ApiError::Json(_) => StatusCode::BAD_GATEWAY,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Upstream { message, .. } => message.clone(),
            ApiError::InvalidRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
            other => other.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.message()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for client and gateway operations.
pub type Result<T> = std::result::Result<T, ApiError>;
