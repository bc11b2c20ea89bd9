//! Feed data model
//!
//! [`FeedData`] is both what the pipeline hands to the serializers and the
//! JSON snapshot that the next run reconciles against. The JSON layout
//! (`elements`, `retrieved` in epoch milliseconds) stays readable by older
//! snapshots, which may lack entry ids.

use crate::extract::identify;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title of the combined feed
pub const COMBINED_FEED_TITLE: &str = "Combined feed";

/// One syndication item extracted from a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable identity, see [`identify`]
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// HTML body
    #[serde(default)]
    pub contents: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// When the entry was first observed
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub retrieved: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Entry {
    /// Builds an entry and derives its id
    ///
    /// # Returns
    ///
    /// * `Some(Entry)` - The entry has a link or a title
    /// * `None` - The entry has neither and cannot be identified
    pub fn new(
        title: Option<String>,
        contents: String,
        link: Option<String>,
        retrieved: DateTime<Utc>,
        image: Option<String>,
    ) -> Option<Self> {
        let id = identify(link.as_deref(), title.as_deref())?;
        Some(Self {
            id,
            title,
            contents,
            link,
            retrieved,
            image,
        })
    }
}

/// One feed's resolved state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedData {
    pub title: String,

    /// Primary page URL
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,

    /// Entries in document order
    #[serde(rename = "elements", default)]
    pub entries: Vec<Entry>,
}

impl FeedData {
    /// Creates a feed without entries
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            favicon: None,
            entries: Vec::new(),
        }
    }

    /// Parses a JSON snapshot, assigning ids to entries that lack one
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut feed: FeedData = serde_json::from_str(json)?;
        feed.assign_missing_ids();
        Ok(feed)
    }

    /// Serializes the feed as a JSON snapshot
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Derives ids for entries that were stored without one
    pub fn assign_missing_ids(&mut self) {
        for entry in self.entries.iter_mut().filter(|entry| entry.id.is_empty()) {
            if let Some(id) = identify(entry.link.as_deref(), entry.title.as_deref()) {
                entry.id = id;
            }
        }
    }

    /// Returns true if any entry carries an image
    pub fn has_images(&self) -> bool {
        self.entries.iter().any(|entry| entry.image.is_some())
    }

    /// A copy of this feed with no entries
    pub fn placeholder(&self) -> Self {
        Self {
            entries: Vec::new(),
            ..self.clone()
        }
    }

    /// Concatenates the entries of `feeds`, suffixing each title with its
    /// feed title
    pub fn combine<'a>(feeds: impl IntoIterator<Item = &'a FeedData>, url: impl Into<String>) -> Self {
        let entries = feeds
            .into_iter()
            .flat_map(|feed| {
                feed.entries.iter().map(move |entry| Entry {
                    title: Some(match &entry.title {
                        Some(title) => format!("{} ({})", title, feed.title),
                        None => format!("({})", feed.title),
                    }),
                    ..entry.clone()
                })
            })
            .collect();

        Self {
            title: COMBINED_FEED_TITLE.to_string(),
            url: url.into(),
            favicon: None,
            entries,
        }
    }
}
