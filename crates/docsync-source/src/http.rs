//! HTTP implementation of the SourceLister trait.
//!
//! Reads a JSON document listing and fetches documents over HTTP with basic
//! auth. One `reqwest::Client` is shared by every fetch, so connections and
//! credentials are reused across concurrent transfers.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use docsync_core::{now_millis, DeliverableRef, ListingEntry, ListingSnapshot};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::{FetchError, ListingError, Result};
use crate::traits::SourceLister;

/// Configuration for an [`HttpSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL documents are resolved against.
    pub site_url: String,
    /// URL of the JSON listing.
    pub list_url: String,
    /// Basic auth user name.
    pub username: String,
    /// Basic auth password.
    pub password: Option<String>,
    /// Server-relative prefix stripped from listed paths before joining
    /// them onto `site_url`.
    pub path_prefix: Option<String>,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
}

impl HttpSourceConfig {
    /// Config with no credentials and default timeouts.
    pub fn new(site_url: impl Into<String>, list_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            list_url: list_url.into(),
            username: String::new(),
            password: None,
            path_prefix: None,
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Set basic auth credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password;
        self
    }
}

/// One row of the listing body. Unknown fields are ignored.
///
/// A null or missing name or path decodes as empty; the snapshot sets such
/// rows aside instead of rejecting the whole body.
#[derive(Debug, Deserialize)]
struct ListingRecord {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "URL Path", default)]
    url_path: Option<String>,
    #[serde(rename = "Property Bag", default)]
    property_bag: Option<String>,
}

/// Listing bodies come either as a bare array or wrapped in `{"value": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingBody {
    Items(Vec<ListingRecord>),
    Wrapped { value: Vec<ListingRecord> },
}

impl ListingBody {
    fn into_records(self) -> Vec<ListingRecord> {
        match self {
            ListingBody::Items(records) | ListingBody::Wrapped { value: records } => records,
        }
    }
}

/// Decode a listing body into snapshot entries.
pub fn decode_listing(body: &[u8]) -> Result<Vec<ListingEntry>> {
    let body: ListingBody =
        serde_json::from_slice(body).map_err(|e| ListingError::Decode(e.to_string()))?;

    Ok(body
        .into_records()
        .into_iter()
        .map(|record| ListingEntry {
            name: record.name.unwrap_or_default(),
            source_path: record.url_path.unwrap_or_default(),
            property_bag: record.property_bag,
        })
        .collect())
}

/// Turn a listed path into an absolute URL.
///
/// Absolute `http(s)` paths are used as they are. Otherwise everything up to
/// and including `path_prefix` is dropped and the rest is joined onto
/// `site`.
pub fn resolve_url(
    site: &Url,
    path_prefix: Option<&str>,
    source_path: &str,
) -> std::result::Result<Url, FetchError> {
    let invalid = |message: String| FetchError::InvalidPath {
        path: source_path.to_string(),
        message,
    };

    if source_path.starts_with("http://") || source_path.starts_with("https://") {
        return Url::parse(source_path).map_err(|e| invalid(e.to_string()));
    }

    let relative = match path_prefix {
        Some(prefix) if !prefix.is_empty() => source_path
            .split_once(prefix)
            .map(|(_, rest)| rest)
            .ok_or_else(|| invalid(format!("path does not contain prefix {}", prefix)))?,
        _ => source_path,
    };

    let joined = format!(
        "{}/{}",
        site.as_str().trim_end_matches('/'),
        relative.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| invalid(e.to_string()))
}

/// HTTP source implementation.
pub struct HttpSource {
    client: Client,
    site: Url,
    config: HttpSourceConfig,
}

impl HttpSource {
    /// Build the shared client for `config`.
    pub fn new(config: HttpSourceConfig) -> Result<Self> {
        let site = Url::parse(&config.site_url)
            .map_err(|e| ListingError::InvalidConfig(format!("site_url: {}", e)))?;
        Url::parse(&config.list_url)
            .map_err(|e| ListingError::InvalidConfig(format!("list_url: {}", e)))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ListingError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            site,
            config,
        })
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        if self.config.username.is_empty() {
            request
        } else {
            request.basic_auth(&self.config.username, self.config.password.as_ref())
        }
    }
}

#[async_trait]
impl SourceLister for HttpSource {
    async fn list_items(&self) -> Result<ListingSnapshot> {
        let response = self
            .get(&self.config.list_url)
            .send()
            .await
            .map_err(|e| ListingError::Connection(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ListingError::Auth(format!(
                "{} returned HTTP {}",
                self.config.list_url,
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(ListingError::Connection(format!(
                "{} returned HTTP {}",
                self.config.list_url,
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ListingError::Connection(e.to_string()))?;
        let entries = decode_listing(&body)?;

        let snapshot = ListingSnapshot::from_entries(entries, now_millis());
        tracing::info!(
            items = snapshot.len(),
            skipped = snapshot.skipped().len(),
            list_url = %self.config.list_url,
            "retrieved source listing"
        );
        Ok(snapshot)
    }

    fn resolve_path(&self, item: &DeliverableRef) -> std::result::Result<String, FetchError> {
        resolve_url(
            &self.site,
            self.config.path_prefix.as_deref(),
            &item.source_path,
        )
        .map(String::from)
    }

    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, FetchError> {
        let response = self.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    after: self.config.request_timeout,
                }
            } else {
                FetchError::Transient {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| FetchError::Transient {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
