use crate::engine::WaitUntil;
use serde::Deserialize;
use std::time::Duration;

/// Default per-navigation timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Main configuration structure: every feed of the batch, in document order
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub feeds: Vec<FeedConfig>,
}

/// A value that may be written either as a single string or as an array of strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Returns the values as a slice, whichever way they were written
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }

    /// Returns the first value, if any
    pub fn first(&self) -> Option<&str> {
        self.as_slice().first().map(String::as_str)
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// What to do when fetching a feed fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFail {
    /// Propagate the failure to the batch
    #[default]
    Error,
    /// Republish the previous run's snapshot unchanged
    Stale,
    /// Produce no output for the feed
    Exclude,
}

/// Settings for a single feed
///
/// Keys are camelCase in the TOML document (`entrySelector`, `onFail`, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    /// Feed identifier: the TOML table name
    #[serde(skip)]
    pub id: String,

    /// Feed title; defaults to the id
    pub title: String,

    /// One or more pages to scrape; the first one is the primary page
    pub url: OneOrMany,

    /// Selector matching every entry container on a page
    pub entry_selector: String,

    /// Selector(s) for the entry title, relative to the entry container
    pub title_selector: OneOrMany,

    /// Selector for the element carrying the entry link (`href`)
    pub link_selector: Option<String>,

    /// Selector(s) for the entry body; the whole container when absent
    pub content_selector: Option<OneOrMany>,

    /// Selector for the element carrying the publication date
    pub date_selector: Option<String>,

    /// strftime-style pattern for dates written as free text
    pub date_format: Option<String>,

    /// Selector for the entry image (`src` or inline background image)
    pub image_selector: Option<String>,

    /// Entries containing any of these are dropped
    #[serde(default)]
    pub filters: Vec<String>,

    /// When non-empty, entries must contain at least one of these
    #[serde(default)]
    pub match_one_of: Vec<String>,

    /// When non-empty, entries must contain all of these
    #[serde(default)]
    pub match_all_of: Vec<String>,

    /// Navigation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Selector to wait for after every navigation
    pub wait_for_selector: Option<String>,

    /// Page readiness condition used while navigating
    #[serde(default)]
    pub wait_until: WaitUntil,

    /// Failure policy
    #[serde(default)]
    pub on_fail: OnFail,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl FeedConfig {
    /// Creates a feed with the required settings and defaults for everything else
    pub fn new(
        id: impl Into<String>,
        url: impl Into<OneOrMany>,
        entry_selector: impl Into<String>,
        title_selector: impl Into<OneOrMany>,
    ) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            url: url.into(),
            entry_selector: entry_selector.into(),
            title_selector: title_selector.into(),
            link_selector: None,
            content_selector: None,
            date_selector: None,
            date_format: None,
            image_selector: None,
            filters: Vec::new(),
            match_one_of: Vec::new(),
            match_all_of: Vec::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            wait_for_selector: None,
            wait_until: WaitUntil::default(),
            on_fail: OnFail::default(),
        }
    }

    /// All pages of the feed, in declared order
    pub fn urls(&self) -> &[String] {
        self.url.as_slice()
    }

    /// The primary page, used for favicon lookup and link resolution
    pub fn primary_url(&self) -> &str {
        self.url.first().unwrap_or_default()
    }

    /// Navigation timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
