//! Error types for the source module.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while reading the source listing.
///
/// Any of these is fatal to a sync run: without a listing there is no delta.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The listing service rejected our credentials.
    #[error("listing authentication failed: {0}")]
    Auth(String),

    /// The listing service could not be reached or answered with an error.
    #[error("listing connection error: {0}")]
    Connection(String),

    /// The listing body could not be decoded.
    #[error("listing decode error: {0}")]
    Decode(String),

    /// Source configuration is unusable.
    #[error("invalid source configuration: {0}")]
    InvalidConfig(String),
}

/// Errors that can occur while resolving or fetching one item.
///
/// These stay local to the item being transferred.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source has no document at this URL.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network-level failure (connect, reset, body read).
    #[error("transient failure fetching {url}: {message}")]
    Transient { url: String, message: String },

    /// The source answered with an unexpected HTTP status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The fetch did not complete in time.
    #[error("fetch of {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    /// The item's path could not be turned into a URL.
    #[error("invalid source path {path}: {message}")]
    InvalidPath { path: String, message: String },
}

impl FetchError {
    /// Whether a later attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transient { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::NotFound(_) | FetchError::InvalidPath { .. } => false,
        }
    }
}

/// Result type for listing operations.
pub type Result<T> = std::result::Result<T, ListingError>;
