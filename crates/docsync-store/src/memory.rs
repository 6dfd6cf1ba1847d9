//! In-memory implementation of the DestinationStore trait.
//!
//! This is primarily for testing. It has the same upload semantics as
//! SQLite but keeps everything in memory with no persistence.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::now_millis;
use crate::traits::{DestinationStore, ObjectInfo, UploadResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<HashMap<String, StoredObject>>,
}

struct StoredObject {
    content: Bytes,
    stored_at: i64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store that already holds `names`, each with empty content.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = now_millis();
        let objects = names
            .into_iter()
            .map(|name| {
                (
                    name.into(),
                    StoredObject {
                        content: Bytes::new(),
                        stored_at: now,
                    },
                )
            })
            .collect();
        Self {
            inner: RwLock::new(objects),
        }
    }

    /// Content stored under `name`.
    pub fn get(&self, name: &str) -> Option<Bytes> {
        let inner = self.inner.read().ok()?;
        inner.get(name).map(|obj| obj.content.clone())
    }

    /// Metadata for the object stored under `name`.
    pub fn stat(&self, name: &str) -> Option<ObjectInfo> {
        let inner = self.inner.read().ok()?;
        inner.get(name).map(|obj| ObjectInfo {
            name: name.to_string(),
            hash: blake3::hash(&obj.content).to_hex().to_string(),
            size: obj.content.len() as u64,
            stored_at: obj.stored_at,
        })
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DestinationStore for MemoryStore {
    async fn list_stored_names(&self) -> Result<BTreeSet<String>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Connection(format!("lock poisoned: {}", e)))?;
        Ok(inner.keys().cloned().collect())
    }

    async fn upload(&self, name: &str, content: Bytes) -> Result<UploadResult> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::upload(name, format!("lock poisoned: {}", e)))?;

        if inner.contains_key(name) {
            return Ok(UploadResult::AlreadyPresent);
        }

        inner.insert(
            name.to_string(),
            StoredObject {
                content,
                stored_at: now_millis(),
            },
        );
        Ok(UploadResult::Uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();

        let result = store
            .upload("A.pdf", Bytes::from_static(b"alpha"))
            .await
            .unwrap();
        assert_eq!(result, UploadResult::Uploaded);

        assert_eq!(store.get("A.pdf").unwrap(), Bytes::from_static(b"alpha"));
        let names = store.list_stored_names().await.unwrap();
        assert!(names.contains("A.pdf"));
    }

    #[tokio::test]
    async fn test_memory_store_idempotent() {
        let store = MemoryStore::new();

        let r1 = store.upload("A.pdf", Bytes::from_static(b"v1")).await.unwrap();
        assert_eq!(r1, UploadResult::Uploaded);

        let r2 = store.upload("A.pdf", Bytes::from_static(b"v2")).await.unwrap();
        assert_eq!(r2, UploadResult::AlreadyPresent);

        // First write is kept
        assert_eq!(store.get("A.pdf").unwrap(), Bytes::from_static(b"v1"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_with_names_prefill() {
        let store = MemoryStore::with_names(["A.pdf", "B.pdf"]);
        let names = store.list_stored_names().await.unwrap();
        assert_eq!(names.len(), 2);

        let info = store.stat("B.pdf").unwrap();
        assert_eq!(info.size, 0);
        assert_eq!(info.hash, blake3::hash(b"").to_hex().to_string());
    }
}
