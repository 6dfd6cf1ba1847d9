//! Error types for the docsync facade.

use docsync_source::{FetchError, ListingError};
use docsync_store::StoreError;
use docsync_sync::SyncError;
use thiserror::Error;

/// Errors that can occur while setting up or running docsync.
#[derive(Debug, Error)]
pub enum DocsyncError {
    /// Sync run aborted during setup.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Source could not be built or listed.
    #[error("source error: {0}")]
    Source(#[from] ListingError),

    /// A single document could not be fetched.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The source listing has no entry with this name.
    #[error("{0} is not in the source listing")]
    NotListed(String),

    /// A name or path that cannot be used as a plain file name.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    /// A listing, fetch or upload did not finish in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Settings file is missing a value or has a bad one.
    #[error("invalid settings: {0}")]
    Settings(String),

    /// Settings or snapshot file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings or snapshot file is not valid JSON.
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for docsync operations.
pub type Result<T> = std::result::Result<T, DocsyncError>;
