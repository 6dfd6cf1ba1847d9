//! End-to-end sync runs against the SQLite destination.

use std::collections::BTreeSet;
use std::time::Duration;

use docsync::core::TransferStatus;
use docsync::source::MemorySource;
use docsync::store::{DestinationStore, MemoryStore, SqliteStore, UploadResult};
use docsync::{SyncConfig, Syncer};
use docsync_testkit::generators::name_set;
use docsync_testkit::{ScriptedSource, TrackingStore};
use proptest::prelude::*;

fn fast_config() -> SyncConfig {
    SyncConfig {
        concurrency: 4,
        fetch_timeout: Duration::from_millis(500),
        upload_timeout: Duration::from_secs(2),
        listing_timeout: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn copies_only_missing_deliverables() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("deliverables.db");

    let dest = SqliteStore::open(&db).unwrap();
    dest.upload("A.pdf", b"old alpha".to_vec().into()).await.unwrap();

    let source = MemorySource::new()
        .with_document("A.pdf", &b"new alpha"[..])
        .with_document("B.pdf", &b"bravo"[..])
        .with_document("C.pdf", &b"charlie"[..]);

    let syncer = Syncer::new(source, dest, fast_config());
    let report = syncer.sync().await.unwrap();

    let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["B.pdf", "C.pdf"]);
    assert!(report.is_complete());

    let dest = syncer.dest();
    assert_eq!(dest.get("A.pdf").await.unwrap().unwrap().as_ref(), b"old alpha");
    assert_eq!(dest.get("B.pdf").await.unwrap().unwrap().as_ref(), b"bravo");
    assert_eq!(dest.get("C.pdf").await.unwrap().unwrap().as_ref(), b"charlie");
}

#[tokio::test]
async fn rerun_against_reopened_database_transfers_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("deliverables.db");
    let config = fast_config();

    let source = ScriptedSource::new().with_documents(["A.pdf", "B.pdf", "C.pdf"]);

    let first = {
        let dest = SqliteStore::open(&db).unwrap();
        docsync::sync::sync(&source, &dest, &config).await.unwrap()
    };
    assert_eq!(first.success_count(), 3);
    let fetches = source.fetch_count();

    let dest = SqliteStore::open(&db).unwrap();
    let second = docsync::sync::sync(&source, &dest, &config).await.unwrap();

    assert_eq!(second.attempted(), 0);
    assert_eq!(second.already_stored, 3);
    assert_eq!(source.fetch_count(), fetches);
}

#[tokio::test]
async fn failed_items_are_reported_and_retried_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let dest = SqliteStore::open(dir.path().join("d.db")).unwrap();
    let config = fast_config();

    let broken = ScriptedSource::new()
        .with_documents(["A.pdf", "B.pdf", "C.pdf", "D.pdf"])
        .failing_fetch("C.pdf")
        .hanging_fetch("D.pdf");

    let report = docsync::sync::sync(&broken, &dest, &config).await.unwrap();
    assert_eq!(report.attempted(), 4);
    assert_eq!(report.success_count(), 2);
    let failed: Vec<_> = report.failed().map(|o| (o.name.as_str(), o.status)).collect();
    assert_eq!(
        failed,
        vec![
            ("C.pdf", TransferStatus::SourceFailure),
            ("D.pdf", TransferStatus::SourceFailure),
        ]
    );

    let healed = ScriptedSource::new().with_documents(["A.pdf", "B.pdf", "C.pdf", "D.pdf"]);
    let report = docsync::sync::sync(&healed, &dest, &config).await.unwrap();
    let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["C.pdf", "D.pdf"]);
    assert!(report.is_complete());
}

#[tokio::test]
async fn concurrent_uploads_land_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let dest = SqliteStore::open(dir.path().join("d.db")).unwrap();
    let names: Vec<String> = (0..100).map(|i| format!("WP{}-D{}.pdf", i / 10, i)).collect();
    let source = ScriptedSource::new()
        .with_documents(names.clone())
        .with_fetch_delay(Duration::from_millis(1));
    let config = SyncConfig {
        concurrency: 16,
        ..fast_config()
    };

    let report = docsync::sync::sync(&source, &dest, &config).await.unwrap();

    assert_eq!(report.success_count(), 100);
    assert!(report.outcomes.iter().all(|o| !o.already_present));
    let stored = dest.list_stored_names().await.unwrap();
    assert_eq!(stored, names.into_iter().collect::<BTreeSet<_>>());
    assert_eq!(dest.blob_count().await.unwrap(), 100);
}

#[tokio::test]
async fn identical_content_is_stored_once() {
    let dest = SqliteStore::open_memory().unwrap();
    let source = MemorySource::new()
        .with_document("report.pdf", &b"same bytes"[..])
        .with_document("report-copy.pdf", &b"same bytes"[..]);

    let report = docsync::sync::sync(&source, &dest, &fast_config()).await.unwrap();

    assert_eq!(report.success_count(), 2);
    assert_eq!(dest.blob_count().await.unwrap(), 1);
    let a = dest.stat("report.pdf").await.unwrap().unwrap();
    let b = dest.stat("report-copy.pdf").await.unwrap().unwrap();
    assert_eq!(a.hash, b.hash);
}

#[tokio::test]
async fn destination_upload_failure_is_isolated() {
    let source = ScriptedSource::new().with_documents(["A.pdf", "B.pdf", "C.pdf"]);
    let dest = TrackingStore::new().failing_upload("B.pdf");

    let report = docsync::sync::sync(&source, &dest, &fast_config()).await.unwrap();

    let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            TransferStatus::Success,
            TransferStatus::DestinationFailure,
            TransferStatus::Success,
        ]
    );
}

#[tokio::test]
async fn uploaded_file_is_not_transferred_again() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("B.pdf");
    std::fs::write(&local, b"local bravo").unwrap();

    let source = MemorySource::new()
        .with_document("A.pdf", &b"alpha"[..])
        .with_document("B.pdf", &b"bravo"[..]);
    let dest = SqliteStore::open(dir.path().join("d.db")).unwrap();
    let syncer = Syncer::new(source, dest, fast_config());

    assert_eq!(syncer.upload_file(&local).await.unwrap(), UploadResult::Uploaded);
    assert!(syncer.upload_file(&local).await.unwrap().is_already_present());

    let report = syncer.sync().await.unwrap();
    let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["A.pdf"]);
    assert_eq!(
        syncer.dest().get("B.pdf").await.unwrap().unwrap().as_ref(),
        b"local bravo"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sync_leaves_destination_holding_the_union(
        listed in name_set(12),
        stored in name_set(12),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let source = ScriptedSource::new().with_documents(listed.iter().cloned());
            let dest = MemoryStore::with_names(stored.iter().cloned());

            let report = docsync::sync::sync(&source, &dest, &fast_config()).await.unwrap();

            let expected: BTreeSet<_> = listed.union(&stored).cloned().collect();
            prop_assert_eq!(dest.list_stored_names().await.unwrap(), expected);
            prop_assert_eq!(report.attempted(), listed.difference(&stored).count());
            prop_assert!(report.is_complete());
            Ok(())
        })?;
    }
}
