//! Error types for the caching worker
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Worker Error Enum ==
/// Unified error type for the caching worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Network fetch failed (connectivity loss, DNS failure, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Cache-only lookup found nothing
    #[error("Not cached: {0}")]
    NotCached(String),

    /// Storage refused the write
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Control task is gone
    #[error("Control channel closed")]
    ChannelClosed,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// Returns the HTTP status used when this error reaches a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkerError::Network(_) => StatusCode::BAD_GATEWAY,
            WorkerError::NotCached(_) => StatusCode::GATEWAY_TIMEOUT,
            WorkerError::QuotaExceeded(_) => StatusCode::INSUFFICIENT_STORAGE,
            WorkerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            WorkerError::ChannelClosed => StatusCode::SERVICE_UNAVAILABLE,
            WorkerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string()
        }));

        (self.status_code(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching worker.
pub type Result<T> = std::result::Result<T, WorkerError>;
