//! Feed Scotty: syndication feeds for websites that don't have them
//!
//! This crate renders configured web pages, extracts entries from them with CSS
//! selectors, gives every entry a stable identity, reconciles the result against
//! the previous run's snapshot and writes Atom/RSS feeds plus JSON snapshots.

pub mod batch;
pub mod config;
pub mod engine;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod navigation;
pub mod output;
pub mod reconcile;

use thiserror::Error;

/// Main error type for Feed Scotty operations
#[derive(Debug, Error)]
pub enum ScottyError {
    #[error("Navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        source: NavigationError,
    },

    #[error("Entry {index} on {url} has neither a link nor a title (feed '{feed}')")]
    MalformedEntry {
        feed: String,
        url: String,
        index: usize,
    },

    #[error("No entries found for feed '{feed}'; check its selectors")]
    EmptyFeed { feed: String },

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Rendering engine error: {0}")]
    Engine(String),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings for feed '{feed}': {message}")]
    Feed { feed: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Errors reported by the rendering engine while navigating
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// The page did not reach the requested wait condition in time
    #[error("Timed out waiting for '{wait_until}'")]
    Timeout { wait_until: engine::WaitUntil },

    /// The navigation was interrupted mid-flight (connection reset, body aborted)
    #[error("Navigation aborted: {0}")]
    Aborted(String),

    /// A selector never appeared on the page
    #[error("Timed out waiting for selector '{0}'")]
    SelectorTimeout(String),

    /// Anything else: DNS failures, refused connections, HTTP error statuses
    #[error("{0}")]
    Other(String),
}

impl NavigationError {
    /// Returns true for the class of errors that is retried with backoff
    pub fn is_transient_abort(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }

    /// Returns true if the error is a wait-condition timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for Feed Scotty operations
pub type Result<T> = std::result::Result<T, ScottyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use batch::{Batch, BatchReport};
pub use config::{Config, FeedConfig, OnFail};
pub use engine::{Engine, HttpEngine, Session, WaitUntil};
pub use extract::{identify, normalize_date, DateSource};
pub use feed::{Entry, FeedData};
pub use reconcile::{reconcile, SnapshotCache};
