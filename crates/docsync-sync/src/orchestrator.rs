//! Sync orchestrator: "update destination from source".
//!
//! A run reads the source listing once, reads the destination's stored
//! names, computes the missing set and hands the matching refs to the
//! transfer engine. Setup failures abort the run; per-item failures are
//! reported.

use std::future::Future;

use docsync_core::{compute_missing, now_millis};
use docsync_source::SourceLister;
use docsync_store::DestinationStore;
use tokio::time::timeout;

use crate::engine::{SyncConfig, TransferEngine};
use crate::error::{Result, SyncError};
use crate::report::{SyncPlan, SyncReport};

/// Compute what a sync would transfer without transferring anything.
///
/// Listing the destination also provisions its container, so this must
/// finish before any transfer starts.
pub async fn plan<S, D>(source: &S, dest: &D, config: &SyncConfig) -> Result<SyncPlan>
where
    S: SourceLister + ?Sized,
    D: DestinationStore + ?Sized,
{
    let snapshot = bounded(config, "source listing", source.list_items()).await??;
    let stored = bounded(config, "destination listing", dest.list_stored_names()).await??;

    let missing = compute_missing(&snapshot.names(), &stored);
    let to_transfer = snapshot.refs_for(&missing);

    tracing::debug!(
        listed = snapshot.len(),
        stored = stored.len(),
        missing = to_transfer.len(),
        "computed sync plan"
    );

    Ok(SyncPlan {
        snapshot,
        stored,
        to_transfer,
    })
}

/// Run the transfers of a plan and build the report.
pub async fn execute<S, D>(plan: SyncPlan, source: &S, dest: &D, config: &SyncConfig) -> SyncReport
where
    S: SourceLister + ?Sized,
    D: DestinationStore + ?Sized,
{
    let started_at = now_millis();
    let already_stored = plan.already_stored();
    let source_count = plan.snapshot.len();
    let duplicate_names = plan.snapshot.duplicate_names();
    let skipped_entries = plan.snapshot.skipped().to_vec();
    let listed_at = plan.snapshot.taken_at();

    let mut outcomes = TransferEngine::new(source, dest, config)
        .transfer_all(plan.to_transfer)
        .await;
    outcomes.sort_by_key(|o| o.id);

    let report = SyncReport {
        outcomes,
        source_count,
        already_stored,
        duplicate_names,
        skipped_entries,
        listed_at,
        started_at,
        finished_at: now_millis(),
    };

    if report.is_complete() && report.skipped_entries.is_empty() {
        tracing::info!("{}", report.summary());
    } else {
        tracing::warn!("{}", report.summary());
    }
    report
}

/// Update the destination from the source.
///
/// Returns `Err` only when the source or destination cannot be listed.
/// A second run with no change at the source attempts nothing.
pub async fn sync<S, D>(source: &S, dest: &D, config: &SyncConfig) -> Result<SyncReport>
where
    S: SourceLister + ?Sized,
    D: DestinationStore + ?Sized,
{
    let plan = plan(source, dest, config).await?;
    Ok(execute(plan, source, dest, config).await)
}

async fn bounded<F: Future>(config: &SyncConfig, what: &str, fut: F) -> Result<F::Output> {
    timeout(config.listing_timeout, fut).await.map_err(|_| {
        SyncError::Timeout(format!(
            "{what} did not complete within {:?}",
            config.listing_timeout
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use docsync_core::{ItemId, TransferStatus};
    use docsync_source::MemorySource;
    use docsync_store::MemoryStore;
    use docsync_testkit::{ScriptedSource, TrackingStore};

    fn fast_config() -> SyncConfig {
        SyncConfig {
            concurrency: 4,
            fetch_timeout: Duration::from_millis(200),
            upload_timeout: Duration::from_millis(200),
            listing_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_transfers_only_missing_names() {
        let source = MemorySource::new()
            .with_document("A.pdf", &b"alpha"[..])
            .with_document("B.pdf", &b"bravo"[..])
            .with_document("C.pdf", &b"charlie"[..]);
        let dest = MemoryStore::with_names(["A.pdf"]);

        let report = sync(&source, &dest, &fast_config()).await.unwrap();

        let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["B.pdf", "C.pdf"]);
        assert!(report.is_complete());
        assert_eq!(report.source_count, 3);
        assert_eq!(report.already_stored, 1);

        // A.pdf was never overwritten.
        assert!(dest.get("A.pdf").unwrap().is_empty());
        assert_eq!(dest.get("B.pdf").unwrap().as_ref(), b"bravo");
        assert_eq!(dest.get("C.pdf").unwrap().as_ref(), b"charlie");
    }

    #[tokio::test]
    async fn test_second_run_attempts_nothing() {
        let source = ScriptedSource::new().with_documents(["A.pdf", "B.pdf", "C.pdf"]);
        let dest = TrackingStore::new();
        let config = fast_config();

        let first = sync(&source, &dest, &config).await.unwrap();
        assert_eq!(first.attempted(), 3);
        let fetches = source.fetch_count();

        let second = sync(&source, &dest, &config).await.unwrap();
        assert_eq!(second.attempted(), 0);
        assert_eq!(second.already_stored, 3);
        assert_eq!(source.fetch_count(), fetches);
        assert_eq!(dest.upload_count(), 3);
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_not_raised() {
        let source = ScriptedSource::new()
            .with_documents(["A.pdf", "B.pdf", "C.pdf"])
            .failing_fetch("B.pdf");
        let dest = TrackingStore::new();

        let report = sync(&source, &dest, &fast_config()).await.unwrap();

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.failure_count(), 1);
        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed[0].name, "B.pdf");
        assert_eq!(failed[0].status, TransferStatus::SourceFailure);

        // The failed item is picked up again on the next run.
        let retry = plan(&source, &dest, &fast_config()).await.unwrap();
        let names: Vec<_> = retry.to_transfer.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B.pdf"]);
    }

    #[tokio::test]
    async fn test_bad_listing_rows_are_skipped_not_raised() {
        let source = ScriptedSource::new().with_documents(["A.pdf", "", "C.pdf"]);
        let dest = TrackingStore::new();

        let report = sync(&source, &dest, &fast_config()).await.unwrap();

        assert_eq!(report.source_count, 2);
        let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["A.pdf", "C.pdf"]);
        assert!(report.is_complete());
        assert_eq!(report.skipped_entries.len(), 1);
        assert_eq!(report.skipped_entries[0].position, ItemId(1));
        assert!(report.summary().ends_with("1 skipped"));
        let mut uploaded = dest.uploaded_names();
        uploaded.sort();
        assert_eq!(uploaded, vec!["A.pdf".to_string(), "C.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_plan_transfers_nothing() {
        let source = ScriptedSource::new().with_documents(["A.pdf", "B.pdf"]);
        let dest = TrackingStore::new().with_names(["B.pdf"]);

        let plan = plan(&source, &dest, &fast_config()).await.unwrap();

        assert_eq!(plan.to_transfer.len(), 1);
        assert_eq!(plan.to_transfer[0].name, "A.pdf");
        assert_eq!(plan.already_stored(), 1);
        assert_eq!(source.fetch_count(), 0);
        assert_eq!(dest.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_names_use_first_entry() {
        let source = ScriptedSource::new().with_documents(["A.pdf", "B.pdf", "A.pdf"]);
        let dest = TrackingStore::new();

        let report = sync(&source, &dest, &fast_config()).await.unwrap();

        assert_eq!(report.attempted(), 2);
        assert_eq!(report.outcomes[0].id.index(), 0);
        assert!(report.duplicate_names.contains("A.pdf"));
        assert_eq!(dest.upload_count(), 2);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_run() {
        let source = ScriptedSource::new()
            .with_documents(["A.pdf"])
            .failing_listing();
        let dest = TrackingStore::new();

        let err = sync(&source, &dest, &fast_config()).await.unwrap_err();

        assert!(matches!(err, SyncError::Listing(_)));
        assert_eq!(dest.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_destination_aborts_run() {
        let source = ScriptedSource::new().with_documents(["A.pdf"]);
        let dest = TrackingStore::new().failing_listing();

        let err = sync(&source, &dest, &fast_config()).await.unwrap_err();

        assert!(matches!(err, SyncError::Destination(_)));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_hanging_listing_times_out() {
        let source = ScriptedSource::new()
            .with_documents(["A.pdf"])
            .hanging_listing();
        let dest = TrackingStore::new();

        let err = sync(&source, &dest, &fast_config()).await.unwrap_err();

        assert!(matches!(err, SyncError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_empty_source_is_complete() {
        let source = ScriptedSource::new();
        let dest = TrackingStore::new();

        let report = sync(&source, &dest, &fast_config()).await.unwrap();

        assert_eq!(report.attempted(), 0);
        assert!(report.is_complete());
    }
}
