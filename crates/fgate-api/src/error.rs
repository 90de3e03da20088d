//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps orchestrator errors to HTTP status codes and JSON error bodies
//! carrying an error code and message. Internal error details are logged,
//! never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::download::DownloadError;
use crate::upload::UploadError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "GATEWAY_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Client input rejected before any gateway call (400).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Request body over the configured limit (413).
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Storage gateway failure (502). The gateway's message is passed through.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Catalog invariant broken (500). Message is logged but not returned.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Gateway(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
            Self::InconsistentState(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INCONSISTENT_STATE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn is_hidden(&self) -> bool {
        matches!(self, Self::InconsistentState(_) | Self::Internal(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if self.is_hidden() {
            tracing::error!(error = %self, "internal server error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidInput(msg) => Self::InvalidInput(msg),
            UploadError::Gateway(msg) => Self::Gateway(msg),
            UploadError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<DownloadError> for AppError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::NotFound(cid) => Self::NotFound(format!("no file with content id {cid}")),
            DownloadError::InconsistentState(msg) => Self::InconsistentState(msg),
            DownloadError::Gateway(msg) => Self::Gateway(msg),
            DownloadError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<crate::catalog::CatalogError> for AppError {
    fn from(err: crate::catalog::CatalogError) -> Self {
        Self::Internal(err.to_string())
    }
}
