//! Concurrent transfer engine.
//!
//! Moves a batch of deliverables from a source to a destination with a
//! bounded number of transfers in flight. Every input ref produces exactly
//! one outcome; a failing item never stops the rest of the batch.

use std::time::Duration;

use docsync_core::{DeliverableRef, TransferOutcome};
use docsync_source::{FetchError, SourceLister};
use docsync_store::{DestinationStore, UploadResult};
use futures::stream::{self, StreamExt};
use tokio::time::timeout;

/// Configuration for sync behavior.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum transfers in flight at once. Zero is treated as one.
    pub concurrency: usize,
    /// Upper bound for one fetch from the source.
    pub fetch_timeout: Duration,
    /// Upper bound for one upload to the destination.
    pub upload_timeout: Duration,
    /// Upper bound for each listing call during setup.
    pub listing_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            fetch_timeout: Duration::from_secs(60),
            upload_timeout: Duration::from_secs(120),
            listing_timeout: Duration::from_secs(60),
        }
    }
}

/// Transfers deliverables from `source` to `dest`.
///
/// The source session is shared read-only by all units. Each unit builds
/// its own outcome, so there is no shared mutable result state.
pub struct TransferEngine<'a, S: ?Sized, D: ?Sized> {
    source: &'a S,
    dest: &'a D,
    config: &'a SyncConfig,
}

impl<'a, S, D> TransferEngine<'a, S, D>
where
    S: SourceLister + ?Sized,
    D: DestinationStore + ?Sized,
{
    pub fn new(source: &'a S, dest: &'a D, config: &'a SyncConfig) -> Self {
        Self {
            source,
            dest,
            config,
        }
    }

    /// Transfer every item and wait for all of them.
    ///
    /// Outcomes are returned in completion order, each tagged with the id
    /// of its ref. An empty batch returns immediately without touching
    /// either endpoint.
    pub async fn transfer_all(&self, items: Vec<DeliverableRef>) -> Vec<TransferOutcome> {
        if items.is_empty() {
            return Vec::new();
        }

        let concurrency = self.config.concurrency.max(1);
        tracing::debug!(items = items.len(), concurrency, "starting transfers");

        stream::iter(items)
            .map(|item| self.transfer_one(item))
            .buffer_unordered(concurrency)
            .collect()
            .await
    }

    /// Resolve, fetch and upload one item.
    ///
    /// Fetch always precedes upload. One attempt each, both under timeout.
    pub async fn transfer_one(&self, item: DeliverableRef) -> TransferOutcome {
        let url = match self.source.resolve_path(&item) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(
                    name = %item.name,
                    error = %e,
                    "could not resolve deliverable path"
                );
                return TransferOutcome::source_failure(&item, e.to_string());
            }
        };

        let content = match timeout(self.config.fetch_timeout, self.source.fetch(&url)).await {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                tracing::error!(name = %item.name, error = %e, "could not retrieve deliverable");
                return TransferOutcome::source_failure(&item, e.to_string());
            }
            Err(_) => {
                let e = FetchError::Timeout {
                    url,
                    after: self.config.fetch_timeout,
                };
                tracing::error!(name = %item.name, error = %e, "could not retrieve deliverable");
                return TransferOutcome::source_failure(&item, e.to_string());
            }
        };

        let size = content.len();
        match timeout(self.config.upload_timeout, self.dest.upload(&item.name, content)).await {
            Ok(Ok(UploadResult::Uploaded)) => {
                tracing::info!(name = %item.name, bytes = size, "uploaded deliverable");
                TransferOutcome::success(&item, false)
            }
            Ok(Ok(UploadResult::AlreadyPresent)) => {
                tracing::info!(name = %item.name, "already uploaded, skipping");
                TransferOutcome::success(&item, true)
            }
            Ok(Err(e)) => {
                tracing::error!(name = %item.name, error = %e, "unable to upload deliverable");
                TransferOutcome::destination_failure(&item, e.to_string())
            }
            Err(_) => {
                let detail = format!(
                    "upload of {} timed out after {:?}",
                    item.name, self.config.upload_timeout
                );
                tracing::error!(name = %item.name, "{}", detail);
                TransferOutcome::destination_failure(&item, detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use docsync_core::{ItemId, TransferStatus};
    use docsync_source::MemorySource;
    use docsync_store::MemoryStore;
    use docsync_testkit::{refs_for_names, ScriptedSource, TrackingStore};

    fn fast_config() -> SyncConfig {
        SyncConfig {
            concurrency: 4,
            fetch_timeout: Duration::from_millis(200),
            upload_timeout: Duration::from_millis(200),
            listing_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_calls() {
        let source = ScriptedSource::new();
        let dest = TrackingStore::new();
        let config = fast_config();

        let outcomes = TransferEngine::new(&source, &dest, &config)
            .transfer_all(Vec::new())
            .await;

        assert!(outcomes.is_empty());
        assert_eq!(source.fetch_count(), 0);
        assert_eq!(dest.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_single_fetch_failure_is_isolated() {
        let source = ScriptedSource::new()
            .with_documents((0..10).map(|i| format!("doc-{i}.pdf")))
            .failing_fetch("doc-3.pdf");
        let dest = TrackingStore::new();
        let config = fast_config();

        let snapshot = source.snapshot();
        let outcomes = TransferEngine::new(&source, &dest, &config)
            .transfer_all(snapshot.items().to_vec())
            .await;

        assert_eq!(outcomes.len(), 10);
        let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "doc-3.pdf");
        assert_eq!(failed[0].status, TransferStatus::SourceFailure);
        assert_eq!(dest.upload_count(), 9);
    }

    #[tokio::test]
    async fn test_upload_failure_is_destination_failure() {
        let source = ScriptedSource::new().with_documents(["A.pdf", "B.pdf"]);
        let dest = TrackingStore::new().failing_upload("B.pdf");
        let config = fast_config();

        let mut outcomes = TransferEngine::new(&source, &dest, &config)
            .transfer_all(source.snapshot().items().to_vec())
            .await;
        outcomes.sort_by_key(|o| o.id);

        assert_eq!(outcomes[0].status, TransferStatus::Success);
        assert_eq!(outcomes[1].status, TransferStatus::DestinationFailure);
        assert!(outcomes[1].detail.as_deref().unwrap().contains("B.pdf"));
    }

    #[tokio::test]
    async fn test_already_present_is_success() {
        let source = MemorySource::new().with_document("A.pdf", &b"alpha"[..]);
        let dest = MemoryStore::with_names(["A.pdf"]);
        let config = fast_config();

        let snapshot = source.list_items().await.unwrap();
        let outcome = TransferEngine::new(&source, &dest, &config)
            .transfer_one(snapshot.items()[0].clone())
            .await;

        assert_eq!(outcome.status, TransferStatus::Success);
        assert!(outcome.already_present);
    }

    #[tokio::test]
    async fn test_unresolvable_path_is_source_failure() {
        let source = MemorySource::new();
        let dest = MemoryStore::new();
        let config = fast_config();

        let item = DeliverableRef::new(ItemId(0), "A.pdf", "/");
        let outcome = TransferEngine::new(&source, &dest, &config)
            .transfer_one(item)
            .await;

        assert_eq!(outcome.status, TransferStatus::SourceFailure);
        assert!(dest.is_empty());
    }

    #[tokio::test]
    async fn test_hanging_fetch_times_out() {
        let source = ScriptedSource::new()
            .with_documents(["A.pdf", "B.pdf", "C.pdf"])
            .hanging_fetch("B.pdf");
        let dest = TrackingStore::new();
        let config = fast_config();

        let started = std::time::Instant::now();
        let mut outcomes = TransferEngine::new(&source, &dest, &config)
            .transfer_all(source.snapshot().items().to_vec())
            .await;
        outcomes.sort_by_key(|o| o.id);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcomes[0].status, TransferStatus::Success);
        assert_eq!(outcomes[1].status, TransferStatus::SourceFailure);
        assert!(outcomes[1].detail.as_deref().unwrap().contains("timed out"));
        assert_eq!(outcomes[2].status, TransferStatus::Success);
    }

    #[tokio::test]
    async fn test_hanging_upload_times_out() {
        let source = ScriptedSource::new().with_documents(["A.pdf", "B.pdf"]);
        let dest = TrackingStore::new().hanging_upload("A.pdf");
        let config = fast_config();

        let mut outcomes = TransferEngine::new(&source, &dest, &config)
            .transfer_all(source.snapshot().items().to_vec())
            .await;
        outcomes.sort_by_key(|o| o.id);

        assert_eq!(outcomes[0].status, TransferStatus::DestinationFailure);
        assert_eq!(outcomes[1].status, TransferStatus::Success);
    }

    #[tokio::test]
    async fn test_hundred_items_upload_exactly_once() {
        let names: Vec<String> = (0..100).map(|i| format!("item-{i:03}.pdf")).collect();
        let source = ScriptedSource::new()
            .with_documents(names.clone())
            .with_fetch_delay(Duration::from_millis(2));
        let dest = TrackingStore::new();
        let config = SyncConfig {
            concurrency: 16,
            ..fast_config()
        };

        let outcomes = TransferEngine::new(&source, &dest, &config)
            .transfer_all(source.snapshot().items().to_vec())
            .await;

        assert_eq!(outcomes.len(), 100);
        assert!(outcomes.iter().all(|o| o.is_success()));

        let uploaded = dest.uploaded_names();
        assert_eq!(uploaded.len(), 100);
        let distinct: BTreeSet<_> = uploaded.iter().cloned().collect();
        assert_eq!(distinct, names.into_iter().collect::<BTreeSet<_>>());
    }

    #[tokio::test]
    async fn test_in_flight_transfers_are_bounded() {
        let source = ScriptedSource::new()
            .with_documents((0..40).map(|i| format!("doc-{i}.pdf")))
            .with_fetch_delay(Duration::from_millis(10));
        let dest = TrackingStore::new();
        let config = SyncConfig {
            concurrency: 3,
            ..fast_config()
        };

        let outcomes = TransferEngine::new(&source, &dest, &config)
            .transfer_all(source.snapshot().items().to_vec())
            .await;

        assert_eq!(outcomes.len(), 40);
        assert!(source.max_in_flight() <= 3);
        assert!(source.max_in_flight() >= 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_progresses() {
        let source = ScriptedSource::new().with_documents(["A.pdf", "B.pdf"]);
        let dest = TrackingStore::new();
        let config = SyncConfig {
            concurrency: 0,
            ..fast_config()
        };

        let outcomes = TransferEngine::new(&source, &dest, &config)
            .transfer_all(refs_for_names(&["A.pdf", "B.pdf"]))
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(source.max_in_flight(), 1);
        assert_eq!(dest.upload_count(), 2);
    }
}
