//! Error types for the sync module.
//!
//! Only setup-phase failures live here. Per-item failures never become a
//! `SyncError`; they are recorded as outcomes.

use thiserror::Error;

/// Errors that abort a whole sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source listing could not be read.
    #[error("source listing failed: {0}")]
    Listing(#[from] docsync_source::ListingError),

    /// The destination could not be listed or provisioned.
    #[error("destination unavailable: {0}")]
    Destination(#[from] docsync_store::StoreError),

    /// A setup call did not complete in time.
    #[error("timeout: {0}")]
    Timeout(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
