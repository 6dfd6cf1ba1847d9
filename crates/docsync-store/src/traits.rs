//! DestinationStore trait: the abstract interface for the blob store that
//! deliverables are copied into.

use std::collections::BTreeSet;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Result of uploading an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadResult {
    /// The object was stored.
    Uploaded,
    /// An object with this name already exists (idempotent - not an error).
    AlreadyPresent,
}

impl UploadResult {
    pub fn is_already_present(&self) -> bool {
        matches!(self, UploadResult::AlreadyPresent)
    }
}

/// Metadata about one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
    /// Blake3 hash of the content, hex encoded.
    pub hash: String,
    pub size: u64,
    /// When the object was stored (Unix ms).
    pub stored_at: i64,
}

/// The DestinationStore trait: async interface for the destination
/// container.
///
/// # Design Notes
///
/// - **Idempotent uploads**: uploading a name that already exists returns
///   `AlreadyPresent` and leaves the stored object untouched.
/// - **Lazy provisioning**: the container is created on first use. Creation
///   happens once even when several callers arrive together.
/// - **Live listing**: `list_stored_names` always reads the store; only the
///   container handle is cached.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Names of every object currently in the container.
    ///
    /// Fails with `Connection` when the store is unreachable.
    async fn list_stored_names(&self) -> Result<BTreeSet<String>>;

    /// Store `content` under `name`.
    ///
    /// # Returns
    /// - `Uploaded` if the name was new.
    /// - `AlreadyPresent` if the container already held the name.
    ///
    /// Any other failure is `UploadFailure`.
    async fn upload(&self, name: &str, content: Bytes) -> Result<UploadResult>;
}
