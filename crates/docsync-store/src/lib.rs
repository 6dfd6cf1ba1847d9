//! # docsync store
//!
//! Destination store abstraction for docsync. Provides a trait-based
//! interface for the blob container deliverables are copied into, with
//! SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`DestinationStore`] - The async trait the sync pipeline writes through
//! - [`SqliteStore`] - Content-addressed persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`UploadResult`] - `Uploaded` or `AlreadyPresent`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use docsync_store::{DestinationStore, SqliteStore, UploadResult};
//!
//! async fn example() {
//!     let store = SqliteStore::open("deliverables.db").unwrap();
//!
//!     let result = store.upload("A.pdf", Bytes::from_static(b"%PDF")).await.unwrap();
//!     assert_eq!(result, UploadResult::Uploaded);
//!
//!     // Uploading the same name again is not an error
//!     let again = store.upload("A.pdf", Bytes::from_static(b"%PDF")).await.unwrap();
//!     assert_eq!(again, UploadResult::AlreadyPresent);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent uploads**: an existing name returns `AlreadyPresent`
//! - **Content addressing**: SQLite blobs are keyed by Blake3 hash
//! - **Lazy containers**: the container is provisioned once, on first use

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, DEFAULT_CONTAINER};
pub use traits::{DestinationStore, ObjectInfo, UploadResult};

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
