//! # docsync core
//!
//! Core primitives for docsync: deliverable refs, immutable listing
//! snapshots, per-item transfer outcomes and the delta between a source and
//! a destination.
//!
//! ## Key Types
//!
//! - [`DeliverableRef`] - One document in a source listing
//! - [`ListingSnapshot`] - The listing captured once per sync run
//! - [`TransferOutcome`] - Terminal status of one item's transfer
//! - [`compute_missing`] - Names at the source but not at the destination
//!
//! ## Usage
//!
//! ```rust
//! use docsync_core::{compute_missing, ListingEntry, ListingSnapshot};
//!
//! let snapshot = ListingSnapshot::from_entries(
//!     vec![
//!         ListingEntry::new("A.pdf", "/docs/A.pdf"),
//!         ListingEntry::new("B.pdf", "/docs/B.pdf"),
//!     ],
//!     0,
//! );
//!
//! let stored = ["A.pdf".to_string()].into_iter().collect();
//! let missing = compute_missing(&snapshot.names(), &stored);
//! let refs = snapshot.refs_for(&missing);
//! assert_eq!(refs[0].name, "B.pdf");
//! ```

pub mod delta;
pub mod error;
pub mod property_bag;
pub mod snapshot;
pub mod types;

pub use delta::compute_missing;
pub use error::{CoreError, Result};
pub use property_bag::{rationalise, Metadata};
pub use snapshot::{ListingEntry, ListingSnapshot, SkippedEntry};
pub use types::{DeliverableRef, ItemId, TransferOutcome, TransferStatus};

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
