//! Previous-snapshot sources
//!
//! A snapshot is the `<feed id>.json` written by an earlier run. It may be
//! published on a web server (the usual CI setup) or lie in a local directory.

use crate::engine::{build_http_client, DEFAULT_USER_AGENT};
use crate::feed::FeedData;
use crate::{Result, ScottyError};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Source of previously written feed snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Loads the snapshot of `feed_id`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(FeedData))` - The previous snapshot
    /// * `Ok(None)` - There is no snapshot for this feed
    /// * `Err(ScottyError)` - The snapshot could not be retrieved or parsed
    async fn load(&self, feed_id: &str) -> Result<Option<FeedData>>;
}

fn snapshot_file_name(feed_id: &str) -> String {
    format!("{}.json", feed_id)
}

/// Appends a trailing slash so relative joins land inside the root
pub fn with_trailing_slash(root: &str) -> String {
    if root.ends_with('/') {
        root.to_string()
    } else {
        format!("{}/", root)
    }
}

/// Root URL feeds are published at, derived from the CI environment
///
/// `CI_PAGES_URL` wins; otherwise `GITHUB_REPOSITORY=owner/repo` maps to
/// `https://owner.github.io/repo/`.
pub fn root_url_from_env() -> Option<String> {
    root_url_from(
        std::env::var("CI_PAGES_URL").ok().as_deref(),
        std::env::var("GITHUB_REPOSITORY").ok().as_deref(),
    )
}

fn root_url_from(ci_pages_url: Option<&str>, github_repository: Option<&str>) -> Option<String> {
    if let Some(url) = ci_pages_url.filter(|url| !url.is_empty()) {
        return Some(with_trailing_slash(url));
    }

    let (owner, repository) = github_repository?.split_once('/')?;
    let repository = repository.split('/').next().unwrap_or_default();
    Some(format!("https://{}.github.io/{}/", owner, repository))
}

/// Snapshots published under a root URL
#[derive(Debug, Clone)]
pub struct HttpSnapshotStore {
    client: Client,
    root: Url,
}

impl HttpSnapshotStore {
    /// Creates a store reading `<root>/<feed id>.json`
    pub fn new(root: &str) -> Result<Self> {
        let root = Url::parse(&with_trailing_slash(root))?;
        let client = build_http_client(DEFAULT_USER_AGENT)?;
        Ok(Self { client, root })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }
}

#[async_trait]
impl SnapshotStore for HttpSnapshotStore {
    async fn load(&self, feed_id: &str) -> Result<Option<FeedData>> {
        let url = self.root.join(&snapshot_file_name(feed_id))?;
        tracing::debug!("Fetching existing feed data from {}", url);

        let http_error = |source| ScottyError::Http {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url.clone()).send().await.map_err(http_error)?;

        if !response.status().is_success() {
            tracing::debug!("No existing feed data at {} ({})", url, response.status());
            return Ok(None);
        }

        let body = response.text().await.map_err(http_error)?;
        Ok(Some(FeedData::from_json(&body)?))
    }
}

/// Snapshots stored in a local directory
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    /// Creates a store reading `<dir>/<feed id>.json`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn load(&self, feed_id: &str) -> Result<Option<FeedData>> {
        let path = self.dir.join(snapshot_file_name(feed_id));
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(FeedData::from_json(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No existing feed data at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Snapshots held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    feeds: HashMap<String, FeedData>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, feed_id: &str, feed: FeedData) -> Self {
        self.feeds.insert(feed_id.to_string(), feed);
        self
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, feed_id: &str) -> Result<Option<FeedData>> {
        Ok(self.feeds.get(feed_id).cloned())
    }
}
