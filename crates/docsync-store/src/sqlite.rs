//! SQLite implementation of the DestinationStore trait.
//!
//! This is the persistent destination backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. Content is addressed
//! by its Blake3 hash: identical bytes uploaded under two names are stored
//! once.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::OnceCell;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::now_millis;
use crate::traits::{DestinationStore, ObjectInfo, UploadResult};

/// Container used when none is configured.
pub const DEFAULT_CONTAINER: &str = "deliverables";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    /// Name of the container objects are stored under.
    container: String,
    /// Row id of the container, provisioned on first use.
    container_id: OnceCell<i64>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            container: DEFAULT_CONTAINER.to_string(),
            container_id: OnceCell::new(),
        }
    }

    /// Store objects under a different container.
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self.container_id = OnceCell::new();
        self
    }

    /// The container this store writes to.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Run a blocking closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Connection(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Connection(format!("spawn_blocking failed: {}", e)))?
    }

    /// Resolve the container id, creating the container on first use.
    ///
    /// Concurrent first callers wait on the same initialization; only one
    /// of them touches the database.
    async fn container_id(&self) -> Result<i64> {
        self.container_id
            .get_or_try_init(|| async {
                let name = self.container.clone();
                let (id, created) = self
                    .blocking(move |conn| provision_container(conn, &name))
                    .await
                    .map_err(|e| match e {
                        StoreError::Connection(_) => e,
                        other => StoreError::Connection(other.to_string()),
                    })?;

                if created {
                    tracing::info!(container = %self.container, "created destination container");
                } else {
                    tracing::debug!(container = %self.container, "opened destination container");
                }
                Ok::<_, StoreError>(id)
            })
            .await
            .copied()
    }

    /// Content stored under `name`, if any.
    pub async fn get(&self, name: &str) -> Result<Option<Bytes>> {
        let container_id = self.container_id().await?;
        let name = name.to_string();

        self.blocking(move |conn| {
            let content: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT b.content FROM objects o JOIN blobs b ON b.hash = o.hash
                     WHERE o.container_id = ?1 AND o.name = ?2",
                    params![container_id, name],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(content.map(Bytes::from))
        })
        .await
    }

    /// Metadata for the object stored under `name`, if any.
    pub async fn stat(&self, name: &str) -> Result<Option<ObjectInfo>> {
        let container_id = self.container_id().await?;
        let name = name.to_string();

        self.blocking(move |conn| {
            let row: Option<(Vec<u8>, i64, i64)> = conn
                .query_row(
                    "SELECT o.hash, b.size, o.stored_at
                     FROM objects o JOIN blobs b ON b.hash = o.hash
                     WHERE o.container_id = ?1 AND o.name = ?2",
                    params![container_id, name],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            row.map(|(hash, size, stored_at)| {
                if hash.len() != 32 {
                    return Err(StoreError::InvalidData(format!(
                        "hash for {} has {} bytes",
                        name,
                        hash.len()
                    )));
                }
                Ok(ObjectInfo {
                    name: name.clone(),
                    hash: hex::encode(&hash),
                    size: size as u64,
                    stored_at,
                })
            })
            .transpose()
        })
        .await
    }

    /// Number of distinct blobs across all containers.
    pub async fn blob_count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

/// Insert the container row if missing and return `(id, created)`.
fn provision_container(conn: &mut Connection, name: &str) -> Result<(i64, bool)> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO containers (name, created_at) VALUES (?1, ?2)",
        params![name, now_millis()],
    )?;

    let id: i64 = conn.query_row(
        "SELECT container_id FROM containers WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;

    Ok((id, inserted > 0))
}

/// Store `content` under `name` inside one transaction.
fn insert_object(
    conn: &mut Connection,
    container_id: i64,
    name: &str,
    content: &[u8],
) -> Result<UploadResult> {
    let tx = conn.transaction()?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM objects WHERE container_id = ?1 AND name = ?2",
            params![container_id, name],
            |row| row.get(0),
        )
        .optional()?;

    if existing.is_some() {
        return Ok(UploadResult::AlreadyPresent);
    }

    let hash = blake3::hash(content);
    let now = now_millis();

    tx.execute(
        "INSERT OR IGNORE INTO blobs (hash, size, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![hash.as_bytes().as_slice(), content.len() as i64, content, now],
    )?;

    tx.execute(
        "INSERT INTO objects (container_id, name, hash, stored_at) VALUES (?1, ?2, ?3, ?4)",
        params![container_id, name, hash.as_bytes().as_slice(), now],
    )?;

    tx.commit()?;
    Ok(UploadResult::Uploaded)
}

#[async_trait]
impl DestinationStore for SqliteStore {
    async fn list_stored_names(&self) -> Result<BTreeSet<String>> {
        let container_id = self.container_id().await?;

        self.blocking(move |conn| {
            let mut stmt = conn.prepare("SELECT name FROM objects WHERE container_id = ?1")?;
            let names = stmt
                .query_map(params![container_id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<BTreeSet<_>, _>>()?;
            Ok(names)
        })
        .await
        .map_err(|e| match e {
            StoreError::Connection(_) => e,
            other => StoreError::Connection(other.to_string()),
        })
    }

    async fn upload(&self, name: &str, content: Bytes) -> Result<UploadResult> {
        let container_id = self
            .container_id()
            .await
            .map_err(|e| StoreError::upload(name, e))?;
        let owned_name = name.to_string();

        self.blocking(move |conn| insert_object(conn, container_id, &owned_name, &content))
            .await
            .map_err(|e| match e {
                StoreError::UploadFailure { .. } => e,
                other => StoreError::upload(name, other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_get() {
        let store = SqliteStore::open_memory().unwrap();

        let result = store
            .upload("A.pdf", Bytes::from_static(b"alpha"))
            .await
            .unwrap();
        assert_eq!(result, UploadResult::Uploaded);

        let content = store.get("A.pdf").await.unwrap().unwrap();
        assert_eq!(content, Bytes::from_static(b"alpha"));

        let info = store.stat("A.pdf").await.unwrap().unwrap();
        assert_eq!(info.size, 5);
        assert_eq!(info.hash, blake3::hash(b"alpha").to_hex().to_string());

        assert!(store.get("missing.pdf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upload_existing_name_is_already_present() {
        let store = SqliteStore::open_memory().unwrap();

        store.upload("A.pdf", Bytes::from_static(b"v1")).await.unwrap();
        let again = store.upload("A.pdf", Bytes::from_static(b"v2")).await.unwrap();
        assert_eq!(again, UploadResult::AlreadyPresent);

        // First content untouched
        let content = store.get("A.pdf").await.unwrap().unwrap();
        assert_eq!(content, Bytes::from_static(b"v1"));
    }

    #[tokio::test]
    async fn test_identical_content_shares_blob() {
        let store = SqliteStore::open_memory().unwrap();

        store.upload("A.pdf", Bytes::from_static(b"same")).await.unwrap();
        store.upload("B.pdf", Bytes::from_static(b"same")).await.unwrap();
        store.upload("C.pdf", Bytes::from_static(b"other")).await.unwrap();

        assert_eq!(store.blob_count().await.unwrap(), 2);
        let names = store.list_stored_names().await.unwrap();
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn test_containers_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.db");

        let first = SqliteStore::open(&path).unwrap();
        first.upload("A.pdf", Bytes::from_static(b"a")).await.unwrap();

        let second = SqliteStore::open(&path).unwrap().with_container("archive");
        assert!(second.list_stored_names().await.unwrap().is_empty());

        let reopened = SqliteStore::open(&path).unwrap();
        let names = reopened.list_stored_names().await.unwrap();
        assert!(names.contains("A.pdf"));
    }

    #[tokio::test]
    async fn test_concurrent_first_use_provisions_one_container() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upload(&format!("doc-{i}.pdf"), Bytes::from(format!("body {i}")))
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), UploadResult::Uploaded);
        }

        let containers: i64 = store
            .blocking(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM containers", [], |row| row.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(containers, 1);
        assert_eq!(store.list_stored_names().await.unwrap().len(), 16);
    }
}
