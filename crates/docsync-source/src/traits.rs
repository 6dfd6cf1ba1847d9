//! SourceLister trait: the abstract interface for the document-list service
//! deliverables are read from.

use async_trait::async_trait;
use bytes::Bytes;
use docsync_core::{DeliverableRef, ListingSnapshot};

use crate::error::{FetchError, Result};

/// The SourceLister trait: enumeration, path resolution and retrieval.
///
/// Implementations hold one authenticated session and share it across all
/// concurrent fetches, so they must be `Send + Sync` and must not need
/// `&mut self` to fetch.
#[async_trait]
pub trait SourceLister: Send + Sync {
    /// Read the current listing.
    ///
    /// Ordering is not stable across calls; the source is live. Every later
    /// step of a run works from the returned snapshot.
    async fn list_items(&self) -> Result<ListingSnapshot>;

    /// Absolute, fetchable URL for an item of a snapshot.
    fn resolve_path(&self, item: &DeliverableRef) -> std::result::Result<String, FetchError>;

    /// Retrieve the bytes at `url` with the session's credentials.
    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, FetchError>;
}
