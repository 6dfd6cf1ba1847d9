//! # docsync Testkit
//!
//! Testing utilities for docsync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: scripted source and destination doubles with per-name
//!   failure injection, hangs and call tracking
//! - **Generators**: Proptest strategies for names, listings and property bags
//!
//! ## Test Fixtures
//!
//! ```rust
//! use docsync_testkit::{ScriptedSource, TrackingStore};
//!
//! let source = ScriptedSource::new()
//!     .with_documents(["A.pdf", "B.pdf"])
//!     .failing_fetch("B.pdf");
//! let dest = TrackingStore::new().with_names(["A.pdf"]);
//! assert_eq!(source.snapshot().len(), 2);
//! assert_eq!(dest.upload_count(), 0);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docsync_testkit::generators::name_set;
//!
//! proptest! {
//!     #[test]
//!     fn nothing_missing_from_itself(names in name_set(20)) {
//!         prop_assert!(docsync_core::compute_missing(&names, &names).is_empty());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{refs_for_names, ScriptedSource, TrackingStore, SCRIPTED_SCHEME};
pub use generators::{deliverable_name, listing_snapshot, name_set, property_bag};
