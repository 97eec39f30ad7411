//! Error types for storage collaborators

use thiserror::Error;

/// Errors surfaced by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// No table/collection is registered for the given uid
    #[error("No collection for uid: {0}")]
    UnknownCollection(String),

    /// A filter expression the backend cannot interpret
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A write conflicted with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create an invalid-filter error
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        StoreError::InvalidFilter(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}

/// Result type alias for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
