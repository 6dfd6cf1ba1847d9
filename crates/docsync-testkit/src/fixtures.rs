//! Test fixtures and helpers.
//!
//! Scripted doubles for both ends of a sync, with per-name failure
//! injection and call tracking.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use docsync_core::{now_millis, DeliverableRef, ItemId, ListingEntry, ListingSnapshot};
use docsync_source::{FetchError, ListingError, SourceLister};
use docsync_store::{DestinationStore, MemoryStore, StoreError, UploadResult};

/// URL scheme used by [`ScriptedSource`].
pub const SCRIPTED_SCHEME: &str = "scripted://";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingBehavior {
    Normal,
    Failing,
    Hanging,
}

/// A source whose listing and fetches are scripted by name.
///
/// Every document's content is `"content of {name}"`.
pub struct ScriptedSource {
    names: Vec<String>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    fetch_delay: Duration,
    listing: ListingBehavior,
    fetches: AtomicUsize,
    listings: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            failing: HashSet::new(),
            hanging: HashSet::new(),
            fetch_delay: Duration::ZERO,
            listing: ListingBehavior::Normal,
            fetches: AtomicUsize::new(0),
            listings: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// List these names, in order. Repeated names are listed repeatedly.
    pub fn with_documents<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Fetches of `name` fail.
    pub fn failing_fetch(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Fetches of `name` never complete.
    pub fn hanging_fetch(mut self, name: impl Into<String>) -> Self {
        self.hanging.insert(name.into());
        self
    }

    /// Every fetch sleeps this long before answering.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// `list_items` fails with a connection error.
    pub fn failing_listing(mut self) -> Self {
        self.listing = ListingBehavior::Failing;
        self
    }

    /// `list_items` never completes.
    pub fn hanging_listing(mut self) -> Self {
        self.listing = ListingBehavior::Hanging;
        self
    }

    /// The snapshot `list_items` would return. Empty names end up in
    /// [`ListingSnapshot::skipped`].
    pub fn snapshot(&self) -> ListingSnapshot {
        let entries = self
            .names
            .iter()
            .map(|name| ListingEntry::new(name.clone(), format!("/{}", name)));
        ListingSnapshot::from_entries(entries, now_millis())
    }

    /// Number of `fetch` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `list_items` calls so far.
    pub fn list_count(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight count when a fetch finishes or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SourceLister for ScriptedSource {
    async fn list_items(&self) -> Result<ListingSnapshot, ListingError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        match self.listing {
            ListingBehavior::Normal => Ok(self.snapshot()),
            ListingBehavior::Failing => {
                Err(ListingError::Connection("scripted listing failure".into()))
            }
            ListingBehavior::Hanging => std::future::pending().await,
        }
    }

    fn resolve_path(&self, item: &DeliverableRef) -> Result<String, FetchError> {
        let name = item.source_path.trim_start_matches('/');
        if name.is_empty() {
            return Err(FetchError::InvalidPath {
                path: item.source_path.clone(),
                message: "empty path".into(),
            });
        }
        Ok(format!("{}{}", SCRIPTED_SCHEME, name))
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight::enter(&self.in_flight, &self.max_in_flight);

        let name = url
            .strip_prefix(SCRIPTED_SCHEME)
            .ok_or_else(|| FetchError::NotFound(url.to_string()))?;

        if self.hanging.contains(name) {
            return std::future::pending().await;
        }
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        if self.failing.contains(name) {
            return Err(FetchError::Transient {
                url: url.to_string(),
                message: "scripted fetch failure".into(),
            });
        }
        if !self.names.iter().any(|n| n == name) {
            return Err(FetchError::NotFound(url.to_string()));
        }

        Ok(Bytes::from(format!("content of {}", name)))
    }
}

/// A memory-backed destination that records every upload call.
pub struct TrackingStore {
    inner: MemoryStore,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    failing_listing: bool,
    attempts: AtomicUsize,
    uploaded: Mutex<Vec<String>>,
}

impl TrackingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: HashSet::new(),
            hanging: HashSet::new(),
            failing_listing: false,
            attempts: AtomicUsize::new(0),
            uploaded: Mutex::new(Vec::new()),
        }
    }

    /// Start out already holding `names`.
    pub fn with_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: MemoryStore::with_names(names),
            ..self
        }
    }

    /// Uploads of `name` fail.
    pub fn failing_upload(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Uploads of `name` never complete.
    pub fn hanging_upload(mut self, name: impl Into<String>) -> Self {
        self.hanging.insert(name.into());
        self
    }

    /// `list_stored_names` fails with a connection error.
    pub fn failing_listing(mut self) -> Self {
        self.failing_listing = true;
        self
    }

    /// Number of `upload` calls so far, including failed ones.
    pub fn upload_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Names that were newly stored, in completion order.
    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploaded.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl Default for TrackingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DestinationStore for TrackingStore {
    async fn list_stored_names(&self) -> docsync_store::Result<BTreeSet<String>> {
        if self.failing_listing {
            return Err(StoreError::Connection("scripted destination outage".into()));
        }
        self.inner.list_stored_names().await
    }

    async fn upload(&self, name: &str, content: Bytes) -> docsync_store::Result<UploadResult> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.hanging.contains(name) {
            return std::future::pending().await;
        }
        if self.failing.contains(name) {
            return Err(StoreError::upload(name, "scripted upload failure"));
        }

        let result = self.inner.upload(name, content).await?;
        if result == UploadResult::Uploaded {
            if let Ok(mut uploaded) = self.uploaded.lock() {
                uploaded.push(name.to_string());
            }
        }
        Ok(result)
    }
}

/// Refs for `names`, ids by position, paths of the form `/{name}`.
pub fn refs_for_names(names: &[&str]) -> Vec<DeliverableRef> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| DeliverableRef::new(ItemId(i), *name, format!("/{}", name)))
        .collect()
}
