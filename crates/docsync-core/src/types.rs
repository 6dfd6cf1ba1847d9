//! Strong type definitions for docsync.
//!
//! Identifiers are newtypes so a listing position can't be mixed up with
//! any other integer flowing through the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a deliverable in the listing it was read from.
///
/// Only meaningful together with the [`ListingSnapshot`](crate::ListingSnapshot)
/// that produced it. Ids are never carried across runs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub usize);

impl ItemId {
    /// The raw listing position.
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A deliverable as seen in one source listing.
///
/// `name` is the identity key at the destination. `source_path` is whatever
/// the source lister needs to build a fetchable URL (absolute or
/// server-relative).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableRef {
    pub id: ItemId,
    pub name: String,
    pub source_path: String,
    /// Raw property bag text, when the listing carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_bag: Option<String>,
}

impl DeliverableRef {
    /// Create a ref without metadata.
    pub fn new(id: ItemId, name: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            source_path: source_path.into(),
            property_bag: None,
        }
    }
}

/// Terminal status of one transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Bytes fetched and the destination holds the name.
    Success,
    /// Path resolution or fetch failed (including timeout).
    SourceFailure,
    /// Upload failed (including timeout).
    DestinationFailure,
}

impl TransferStatus {
    /// Whether this status counts as a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(self, TransferStatus::Success)
    }

    /// Short label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            TransferStatus::Success => "success",
            TransferStatus::SourceFailure => "source failure",
            TransferStatus::DestinationFailure => "destination failure",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The result of transferring one deliverable.
///
/// Tagged with the originating [`ItemId`] so callers can restore listing
/// order after a concurrent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub id: ItemId,
    pub name: String,
    pub status: TransferStatus,
    /// The destination already held this name when the upload ran.
    #[serde(default)]
    pub already_present: bool,
    /// Failure cause, for failed outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TransferOutcome {
    /// A successful transfer.
    pub fn success(item: &DeliverableRef, already_present: bool) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            status: TransferStatus::Success,
            already_present,
            detail: None,
        }
    }

    /// A transfer that failed on the source side.
    pub fn source_failure(item: &DeliverableRef, detail: impl Into<String>) -> Self {
        Self::failure(item, TransferStatus::SourceFailure, detail)
    }

    /// A transfer that failed on the destination side.
    pub fn destination_failure(item: &DeliverableRef, detail: impl Into<String>) -> Self {
        Self::failure(item, TransferStatus::DestinationFailure, detail)
    }

    fn failure(item: &DeliverableRef, status: TransferStatus, detail: impl Into<String>) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            status,
            already_present: false,
            detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TransferStatus::Success
    }
}
