//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store or its container could not be reached or provisioned.
    #[error("connection error: {0}")]
    Connection(String),

    /// An upload failed for a reason other than the name already existing.
    #[error("upload of {name} failed: {cause}")]
    UploadFailure { name: String, cause: String },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Wrap any error as an upload failure for `name`.
    pub fn upload(name: &str, cause: impl std::fmt::Display) -> Self {
        StoreError::UploadFailure {
            name: name.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
