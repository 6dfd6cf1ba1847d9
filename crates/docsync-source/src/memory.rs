//! In-memory implementation of the SourceLister trait.
//!
//! Documents live in a map keyed by name. The listing is live: documents
//! added after a snapshot was taken show up in the next `list_items` call
//! only.

use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use docsync_core::{now_millis, DeliverableRef, ListingEntry, ListingSnapshot};

use crate::error::{FetchError, ListingError, Result};
use crate::traits::SourceLister;

/// URL scheme used for in-memory documents.
pub const MEMORY_SCHEME: &str = "memory://";

/// In-memory source implementation.
pub struct MemorySource {
    documents: RwLock<Vec<(String, Bytes)>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Add a document (builder style).
    pub fn with_document(self, name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.add_document(name, content);
        self
    }

    /// Add a document to the live listing.
    ///
    /// A name that is already listed is listed again; names are not
    /// validated for uniqueness, same as a real listing service.
    pub fn add_document(&self, name: impl Into<String>, content: impl Into<Bytes>) {
        if let Ok(mut docs) = self.documents.write() {
            docs.push((name.into(), content.into()));
        }
    }

    /// Remove every document with this name.
    pub fn remove_document(&self, name: &str) {
        if let Ok(mut docs) = self.documents.write() {
            docs.retain(|(n, _)| n != name);
        }
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceLister for MemorySource {
    async fn list_items(&self) -> Result<ListingSnapshot> {
        let docs = self
            .documents
            .read()
            .map_err(|e| ListingError::Connection(format!("lock poisoned: {}", e)))?;

        let entries = docs
            .iter()
            .map(|(name, _)| ListingEntry::new(name.clone(), format!("/{}", name)));
        Ok(ListingSnapshot::from_entries(entries, now_millis()))
    }

    fn resolve_path(&self, item: &DeliverableRef) -> std::result::Result<String, FetchError> {
        let path = item.source_path.trim_start_matches('/');
        if path.is_empty() {
            return Err(FetchError::InvalidPath {
                path: item.source_path.clone(),
                message: "empty path".to_string(),
            });
        }
        Ok(format!("{}{}", MEMORY_SCHEME, path))
    }

    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, FetchError> {
        let name = url
            .strip_prefix(MEMORY_SCHEME)
            .ok_or_else(|| FetchError::NotFound(url.to_string()))?;

        let docs = self.documents.read().map_err(|e| FetchError::Transient {
            url: url.to_string(),
            message: format!("lock poisoned: {}", e),
        })?;

        docs.iter()
            .find(|(n, _)| n == name)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
