//! Error types for the entry store
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::engine::EngineError;
use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for store operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No live entry under the key
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The existing entry is write-protected
    #[error("Key is read-only: {0}")]
    ReadOnly(String),

    /// Invalid option or value supplied by the caller
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The storage engine failed
    #[error(transparent)]
    Engine(#[from] EngineError),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::ReadOnly(_) => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Engine(EngineError::QuotaExceeded { .. }) => {
                StatusCode::INSUFFICIENT_STORAGE
            }
            CacheError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for store operations.
pub type Result<T> = std::result::Result<T, CacheError>;
