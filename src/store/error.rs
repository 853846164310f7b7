//! Error types for store operations.

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No entry with the requested ID exists in any segment
    #[error("log entry with ID {0} not found")]
    NotFound(i64),

    /// The store no longer accepts submissions
    #[error("store is closed")]
    Closed,

    #[error("not a segment file name: {0}")]
    InvalidSegmentName(String),
}

impl StoreError {
    /// Whether this is a lookup miss rather than a storage failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
