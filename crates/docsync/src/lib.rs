//! # docsync
//!
//! The unified API for docsync: copy deliverables listed by a document
//! service into a content-addressed blob store, transferring only what the
//! store does not already hold.
//!
//! ## Overview
//!
//! - **Source**: a document listing plus authenticated fetches
//! - **Destination**: a container of named objects with idempotent uploads
//! - **Sync**: list both ends, compute the missing names, transfer them
//!   concurrently and report one outcome per item
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docsync::{Settings, Syncer};
//!
//! async fn example() -> docsync::Result<()> {
//!     let settings = Settings::load("docsync.json")?;
//!     let syncer = Syncer::from_settings(&settings)?;
//!
//!     let report = syncer.sync().await?;
//!     for outcome in report.failed() {
//!         eprintln!("{}: {}", outcome.name, outcome.status);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `docsync::core` - Refs, snapshots, outcomes, delta, property bags
//! - `docsync::store` - Destination store abstraction and SQLite
//! - `docsync::source` - Source lister abstraction and HTTP
//! - `docsync::sync` - Transfer engine and orchestrator

pub mod config;
pub mod error;
pub mod syncer;

// Re-export component crates
pub use docsync_core as core;
pub use docsync_source as source;
pub use docsync_store as store;
pub use docsync_sync as sync;

pub use config::Settings;
pub use error::{DocsyncError, Result};
pub use syncer::{load_snapshot, save_snapshot, snapshot_metadata, Syncer};

pub use docsync_core::{
    DeliverableRef, ItemId, ListingSnapshot, Metadata, TransferOutcome, TransferStatus,
};
pub use docsync_sync::{SyncConfig, SyncPlan, SyncReport};
