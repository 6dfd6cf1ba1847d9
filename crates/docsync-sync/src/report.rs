//! Sync plans and reports.

use std::collections::BTreeSet;

use docsync_core::{DeliverableRef, ListingSnapshot, SkippedEntry, TransferOutcome};

/// What a sync run would transfer, computed from one listing snapshot.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// The listing every later step works from.
    pub snapshot: ListingSnapshot,
    /// Names already at the destination when the plan was made.
    pub stored: BTreeSet<String>,
    /// Refs to transfer, one per missing name, in listing order.
    pub to_transfer: Vec<DeliverableRef>,
}

impl SyncPlan {
    /// Number of listed names already at the destination.
    pub fn already_stored(&self) -> usize {
        self.snapshot
            .names()
            .iter()
            .filter(|name| self.stored.contains(*name))
            .count()
    }

    /// True when nothing needs transferring.
    pub fn is_empty(&self) -> bool {
        self.to_transfer.is_empty()
    }
}

/// Result of a sync run.
///
/// The outcome list is the authoritative per-item record: every ref that
/// was scheduled appears exactly once.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Per-item outcomes, ordered by listing position.
    pub outcomes: Vec<TransferOutcome>,
    /// Entries in the source listing.
    pub source_count: usize,
    /// Listed names skipped because the destination already had them.
    pub already_stored: usize,
    /// Names listed more than once at the source.
    pub duplicate_names: BTreeSet<String>,
    /// Listing rows left out of the run because they had no name or path.
    pub skipped_entries: Vec<SkippedEntry>,
    /// When the source listing was taken (Unix ms).
    pub listed_at: i64,
    /// When the run started (Unix ms).
    pub started_at: i64,
    /// When the run finished (Unix ms).
    pub finished_at: i64,
}

impl SyncReport {
    /// Outcomes that succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    /// Outcomes that failed.
    pub fn failed(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    /// Number of transfers attempted.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether every attempted transfer succeeded. Skipped listing rows
    /// were never attempted and do not count against this.
    pub fn is_complete(&self) -> bool {
        self.failure_count() == 0
    }

    /// One-line summary for logs and the CLI.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} listed, {} already stored, {} attempted, {} succeeded, {} failed",
            self.source_count,
            self.already_stored,
            self.attempted(),
            self.success_count(),
            self.failure_count()
        );
        if !self.skipped_entries.is_empty() {
            line.push_str(&format!(", {} skipped", self.skipped_entries.len()));
        }
        line
    }
}
