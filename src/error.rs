//! Error types for the cache and the remote store
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;

// == Cache Error Enum ==
/// Error type for local cache and server operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache (absent or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

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
            CacheError::InvalidConfig(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Remote Error Enum ==
/// Failures talking to the remote key/value store.
///
/// None of these ever escape [`crate::cache::ReadThroughCache`]; they are
/// logged and turned into a miss (reads) or dropped (writes).
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Connection, DNS or TLS failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The call did not finish within the configured bound
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx answer other than 404 on reads
    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport succeeded but the body is not a valid envelope
    #[error("malformed remote response: {0}")]
    Malformed(String),

    /// The envelope reported `success: false` for a write
    #[error("remote rejected the request: {0}")]
    Rejected(String),

    /// The base URL plus key did not form a valid URL
    #[error("invalid remote url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl RemoteError {
    /// True for network, timeout and status failures.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RemoteError::Transport(_) | RemoteError::Timeout(_) | RemoteError::Status { .. }
        )
    }

    /// True when the remote answered with something that cannot be a cache value.
    pub fn is_malformed(&self) -> bool {
        matches!(self, RemoteError::Malformed(_) | RemoteError::Rejected(_))
    }
}

/// Result type for remote store calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
