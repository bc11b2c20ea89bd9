//! Configuration module for Feed Scotty
//!
//! This module handles loading, parsing, and validating the TOML feed list.
//!
//! # Example
//!
//! ```no_run
//! use feed_scotty::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("feeds.toml")).unwrap();
//! for feed in &config.feeds {
//!     println!("{} -> {}", feed.id, feed.primary_url());
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FeedConfig, OnFail, OneOrMany, DEFAULT_TIMEOUT_SECS};

// Re-export parser and validation functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, DEFAULT_SETTINGS_ID,
};
pub use validation::{validate, validate_feed, COMBINED_FEED_ID};
