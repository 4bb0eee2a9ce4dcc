//! Error types for the cache engine and its HTTP surface
//!
//! Provides unified error handling using thiserror. The cache operations
//! themselves never fail; these errors cover persistence and request handling.

use std::io;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors surfaced by the HTTP handlers.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache (absent or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence was requested while the subsystem is disabled
    #[error("Persistence is disabled")]
    PersistenceDisabled,

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
            CacheError::PersistenceDisabled => StatusCode::CONFLICT,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP handlers.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Persistence Error Enum ==
/// Failures inside the persistence subsystem.
///
/// These are logged and swallowed at the subsystem boundary; they never reach
/// `get`/`set` callers.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A value or snapshot could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing durable storage failed
    #[error("I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Compressing or decompressing the snapshot failed
    #[error("Snapshot codec failed: {0}")]
    Codec(#[source] io::Error),

    /// The snapshot file exists but cannot be decoded
    #[error("Corrupt snapshot {}: {reason}", path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error only means no snapshot has been written yet.
    pub fn is_missing_snapshot(&self) -> bool {
        matches!(self, PersistenceError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
