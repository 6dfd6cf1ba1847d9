//! Settings file.
//!
//! One JSON document holds the source endpoints and credentials, the
//! destination database and the transfer tuning knobs:
//!
//! ```json
//! {
//!   "source": {
//!     "site_url": "https://docs.example.org/sites/project/",
//!     "list_url": "https://docs.example.org/sites/project/deliverables.json",
//!     "username": "sync-bot",
//!     "password": "secret",
//!     "path_prefix": "/sites/project/"
//!   },
//!   "destination": { "database": "deliverables.db" },
//!   "transfer": { "concurrency": 8 }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use docsync_source::HttpSourceConfig;
use docsync_store::{SqliteStore, DEFAULT_CONTAINER};
use docsync_sync::SyncConfig;
use serde::Deserialize;

use crate::error::{DocsyncError, Result};

/// Top-level settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub source: SourceSettings,
    pub destination: DestinationSettings,
    #[serde(default)]
    pub transfer: TransferSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSettings {
    pub site_url: String,
    pub list_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub path_prefix: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationSettings {
    /// Path of the SQLite database.
    pub database: PathBuf,
    #[serde(default)]
    pub container: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferSettings {
    pub concurrency: Option<usize>,
    pub fetch_timeout_secs: Option<u64>,
    pub upload_timeout_secs: Option<u64>,
}

impl Settings {
    /// Read and validate a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| DocsyncError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            DocsyncError::Json { source, .. } => DocsyncError::Json {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate settings from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(raw).map_err(|source| DocsyncError::Json {
            path: "<settings>".to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.source.site_url.trim().is_empty() {
            return Err(DocsyncError::Settings("source.site_url is empty".into()));
        }
        if self.source.list_url.trim().is_empty() {
            return Err(DocsyncError::Settings("source.list_url is empty".into()));
        }
        if self.transfer.concurrency == Some(0) {
            return Err(DocsyncError::Settings(
                "transfer.concurrency must be at least 1".into(),
            ));
        }
        if matches!(self.destination.container.as_deref(), Some(c) if c.trim().is_empty()) {
            return Err(DocsyncError::Settings("destination.container is empty".into()));
        }
        Ok(())
    }

    /// Replace the source password, e.g. with one taken from the environment.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        if password.is_some() {
            self.source.password = password;
        }
        self
    }

    /// Config for the HTTP source.
    pub fn source_config(&self) -> HttpSourceConfig {
        let mut config = HttpSourceConfig::new(&self.source.site_url, &self.source.list_url)
            .with_credentials(&self.source.username, self.source.password.clone());
        config.path_prefix = self.source.path_prefix.clone();
        if let Some(secs) = self.source.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        config
    }

    /// Transfer tuning, with defaults for anything unset.
    pub fn sync_config(&self) -> SyncConfig {
        let defaults = SyncConfig::default();
        let t = &self.transfer;
        SyncConfig {
            concurrency: t.concurrency.unwrap_or(defaults.concurrency),
            fetch_timeout: t
                .fetch_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            upload_timeout: t
                .upload_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.upload_timeout),
            listing_timeout: self
                .source
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.listing_timeout),
        }
    }

    /// Container name at the destination.
    pub fn container(&self) -> &str {
        self.destination
            .container
            .as_deref()
            .unwrap_or(DEFAULT_CONTAINER)
    }

    /// Open the destination store.
    pub fn open_store(&self) -> Result<SqliteStore> {
        Ok(SqliteStore::open(&self.destination.database)?.with_container(self.container()))
    }
}
