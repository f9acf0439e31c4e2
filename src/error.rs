//! Error types for the tiered cache
//!
//! Construction failures are surfaced; per-key I/O and codec failures are
//! logged by the stores and never reach callers.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache directory path could not be computed from name and root
    #[error("Invalid cache directory path: {0}")]
    DirectoryPathInvalid(String),

    /// The cache directory could not be created
    #[error("Failed to create cache directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized for the disk tier
    #[error("Codec error: {0}")]
    Codec(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key not present in either tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::DirectoryPathInvalid(_)
            | CacheError::DirectoryCreateFailed { .. }
            | CacheError::Codec(_)
            | CacheError::Io(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (CacheError::NotFound("key".to_string()), StatusCode::NOT_FOUND),
            (
                CacheError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CacheError::Codec("bad bytes".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CacheError::DirectoryPathInvalid("".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }

    #[test]
    fn test_directory_create_failed_message() {
        let err = CacheError::DirectoryCreateFailed {
            path: PathBuf::from("/nope/cache"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/nope/cache"));
    }
}
