use crate::feed::FeedData;
use crate::output::{to_atom, to_rss, OutputError, OutputResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "public";

/// Syndication format of a written feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Atom,
    Rss,
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom => f.write_str("Atom"),
            Self::Rss => f.write_str("RSS 2.0"),
        }
    }
}

/// Serializes `feed` as Atom, or as RSS when any entry has an image
pub fn render_feed(feed: &FeedData, updated: DateTime<Utc>) -> OutputResult<(FeedFormat, String)> {
    if feed.has_images() {
        Ok((FeedFormat::Rss, to_rss(feed, updated)?))
    } else {
        Ok((FeedFormat::Atom, to_atom(feed, updated)?))
    }
}

/// Files written for one feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFeed {
    pub feed_id: String,
    pub format: FeedFormat,
    pub xml_path: PathBuf,
    pub json_path: PathBuf,
    pub entries: usize,
}

/// Writes `<id>.xml` and `<id>.json` into an output directory
#[derive(Debug, Clone)]
pub struct FeedWriter {
    dir: PathBuf,
}

impl FeedWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the syndication document and the JSON snapshot of `feed`
    ///
    /// The output directory is created if needed.
    pub async fn write(&self, feed_id: &str, feed: &FeedData) -> OutputResult<WrittenFeed> {
        self.write_files(feed_id, feed, feed).await
    }

    /// Publishes `previous` without entries while keeping it as the snapshot
    ///
    /// Entries seen before keep their first-seen timestamps on the next run.
    pub async fn write_placeholder(
        &self,
        feed_id: &str,
        previous: &FeedData,
    ) -> OutputResult<WrittenFeed> {
        self.write_files(feed_id, &previous.placeholder(), previous)
            .await
    }

    async fn write_files(
        &self,
        feed_id: &str,
        feed: &FeedData,
        snapshot: &FeedData,
    ) -> OutputResult<WrittenFeed> {
        let (format, xml) = render_feed(feed, Utc::now())?;
        let json = snapshot
            .to_json()
            .map_err(|e| OutputError::Format(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let xml_path = self.dir.join(format!("{}.xml", feed_id));
        let json_path = self.dir.join(format!("{}.json", feed_id));
        tokio::fs::write(&xml_path, xml)
            .await
            .map_err(|e| OutputError::Write(format!("{}: {}", xml_path.display(), e)))?;
        tokio::fs::write(&json_path, json)
            .await
            .map_err(|e| OutputError::Write(format!("{}: {}", json_path.display(), e)))?;

        tracing::debug!(
            "Wrote {} ({}, {} entries)",
            xml_path.display(),
            format,
            feed.entries.len()
        );

        Ok(WrittenFeed {
            feed_id: feed_id.to_string(),
            format,
            xml_path,
            json_path,
            entries: feed.entries.len(),
        })
    }
}
