//! The Syncer: one source, one destination, one config.
//!
//! Owns both endpoints for the lifetime of a process so the source session
//! and the destination container handle are created once and reused.

use std::path::{Path, PathBuf};

use docsync_core::{ListingSnapshot, Metadata};
use docsync_source::{FetchError, HttpSource, SourceLister};
use docsync_store::{DestinationStore, SqliteStore, UploadResult};
use docsync_sync::{SyncConfig, SyncPlan, SyncReport};
use tokio::time::timeout;

use crate::config::Settings;
use crate::error::{DocsyncError, Result};

/// A configured source/destination pair.
pub struct Syncer<S, D> {
    source: S,
    dest: D,
    config: SyncConfig,
}

impl<S: SourceLister, D: DestinationStore> Syncer<S, D> {
    pub fn new(source: S, dest: D, config: SyncConfig) -> Self {
        Self {
            source,
            dest,
            config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn dest(&self) -> &D {
        &self.dest
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Compute the transfer plan without transferring.
    pub async fn plan(&self) -> Result<SyncPlan> {
        Ok(docsync_sync::plan(&self.source, &self.dest, &self.config).await?)
    }

    /// Transfer everything in `plan`.
    pub async fn execute(&self, plan: SyncPlan) -> SyncReport {
        docsync_sync::execute(plan, &self.source, &self.dest, &self.config).await
    }

    /// Update the destination from the source.
    pub async fn sync(&self) -> Result<SyncReport> {
        Ok(docsync_sync::sync(&self.source, &self.dest, &self.config).await?)
    }

    /// Fetch one listed deliverable and write it to `out_dir/<name>`,
    /// creating `out_dir` if needed. Returns the written path.
    pub async fn download(&self, name: &str, out_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let target = out_dir.as_ref().join(plain_file_name(name)?);

        let snapshot = timeout(self.config.listing_timeout, self.source.list_items())
            .await
            .map_err(|_| {
                DocsyncError::Timeout(format!(
                    "source listing did not complete within {:?}",
                    self.config.listing_timeout
                ))
            })??;
        let item = snapshot
            .first_by_name(name)
            .ok_or_else(|| DocsyncError::NotListed(name.to_string()))?;

        let url = self.source.resolve_path(item)?;
        let content = timeout(self.config.fetch_timeout, self.source.fetch(&url))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.clone(),
                after: self.config.fetch_timeout,
            })??;

        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir).map_err(|source| DocsyncError::Io {
            path: out_dir.display().to_string(),
            source,
        })?;
        std::fs::write(&target, &content).map_err(|source| DocsyncError::Io {
            path: target.display().to_string(),
            source,
        })?;

        tracing::info!(
            name,
            path = %target.display(),
            size = content.len(),
            "downloaded deliverable"
        );
        Ok(target)
    }

    /// Upload a local file to the destination under its file name.
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> Result<UploadResult> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DocsyncError::InvalidFileName(path.display().to_string()))?;
        let content = std::fs::read(path).map_err(|source| DocsyncError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let result = timeout(self.config.upload_timeout, self.dest.upload(name, content.into()))
            .await
            .map_err(|_| {
                DocsyncError::Timeout(format!(
                    "upload of {name} did not complete within {:?}",
                    self.config.upload_timeout
                ))
            })??;

        tracing::info!(name, already_present = result.is_already_present(), "uploaded file");
        Ok(result)
    }
}

/// `name` as a single path component, so downloads stay inside the
/// output directory.
fn plain_file_name(name: &str) -> Result<&str> {
    match Path::new(name).file_name().and_then(|n| n.to_str()) {
        Some(file_name) if file_name == name => Ok(file_name),
        _ => Err(DocsyncError::InvalidFileName(name.to_string())),
    }
}

impl Syncer<HttpSource, SqliteStore> {
    /// Build the HTTP source and SQLite destination described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let source = HttpSource::new(settings.source_config())?;
        let dest = settings.open_store()?;
        Ok(Self::new(source, dest, settings.sync_config()))
    }
}

/// Write a listing snapshot as pretty JSON.
pub fn save_snapshot(snapshot: &ListingSnapshot, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(snapshot).map_err(|source| DocsyncError::Json {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| DocsyncError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Read a listing snapshot written by [`save_snapshot`].
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<ListingSnapshot> {
    let path = path.as_ref();
    let raw = std::fs::read(path).map_err(|source| DocsyncError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| DocsyncError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Rationalised metadata of every item in a snapshot that carries a
/// property bag, in listing order.
pub fn snapshot_metadata(snapshot: &ListingSnapshot) -> Vec<(String, Metadata)> {
    snapshot
        .items()
        .iter()
        .filter_map(|item| {
            item.property_bag
                .as_deref()
                .map(|bag| (item.name.clone(), docsync_core::rationalise(bag)))
        })
        .collect()
}
