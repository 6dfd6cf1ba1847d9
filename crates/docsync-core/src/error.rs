//! Error types for docsync core.

use thiserror::Error;

use crate::types::ItemId;

/// Errors raised while building or reading a listing snapshot.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("listing entry {0} has an empty name")]
    EmptyName(ItemId),

    #[error("listing entry {0} has no source path")]
    MissingPath(ItemId),

    #[error("no item {0} in this listing")]
    UnknownItem(ItemId),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
