//! # docsync Sync
//!
//! The delta-transfer pipeline.
//!
//! ## Overview
//!
//! A sync run copies every deliverable the source lists but the destination
//! does not yet hold. Only the transfer step is concurrent; both listings
//! are read once, sequentially, before any transfer starts.
//!
//! ## Key Properties
//!
//! - **Idempotent**: a second run with no source change transfers nothing
//! - **Isolated failures**: one failing item never stops the others
//! - **Bounded**: at most `concurrency` transfers in flight, each under timeout
//! - **Cancellable**: dropping the run future drops every in-flight transfer
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docsync_source::MemorySource;
//! use docsync_store::MemoryStore;
//! use docsync_sync::{sync, SyncConfig};
//!
//! async fn example() -> docsync_sync::Result<()> {
//!     let source = MemorySource::new().with_document("A.pdf", &b"alpha"[..]);
//!     let dest = MemoryStore::new();
//!
//!     let report = sync(&source, &dest, &SyncConfig::default()).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Flow
//!
//! ```text
//! Source                Orchestrator              Destination
//!   |<---- list_items -------|                         |
//!   |                        |---- list_stored_names ->|
//!   |                        | compute_missing         |
//!   |<---- fetch (xN) -------|                         |
//!   |                        |---- upload (xN) ------->|
//! ```

pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod report;

pub use engine::{SyncConfig, TransferEngine};
pub use error::{Result, SyncError};
pub use orchestrator::{execute, plan, sync};
pub use report::{SyncPlan, SyncReport};
