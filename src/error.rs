//! Error types for the link cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for path cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A segment of the path is missing from the cache
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Reset was asked for a key outside the cache template
    #[error("Invalid key: {0} is not a template key")]
    InvalidKey(String),

    /// The value at the path can neither be extended nor pushed to
    #[error("Cannot append to {path}: existing value is {kind}")]
    AppendTypeError { path: String, kind: &'static str },

    /// Clean was asked for a path that does not hold a mapping
    #[error("Not a mapping: {0}")]
    NotAMapping(String),

    /// An admin request body failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A cache path was built from zero segments
    #[error("Cache path must have at least one segment")]
    EmptyPath,

    /// The snapshot could not be written
    #[error("Failed to persist cache to {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::KeyNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidKey(_)
            | CacheError::InvalidRequest(_)
            | CacheError::EmptyPath => StatusCode::BAD_REQUEST,
            CacheError::AppendTypeError { .. } | CacheError::NotAMapping(_) => {
                StatusCode::CONFLICT
            }
            CacheError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
