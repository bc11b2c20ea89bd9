use crate::config::types::{Config, FeedConfig};
use crate::config::validation::validate;
use crate::{ConfigError, ConfigResult};
use sha2::{Digest, Sha256};
use std::path::Path;
use toml::{Table, Value};

/// Table name holding settings shared by every feed
pub const DEFAULT_SETTINGS_ID: &str = "default";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use feed_scotty::config::load_config;
///
/// let config = load_config(Path::new("feeds.toml")).unwrap();
/// println!("Feeds: {}", config.feeds.len());
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Parses a configuration document without validating it
///
/// Every top-level table except `default` is a feed. The `default` table is
/// merged under each feed table, so per-feed keys win.
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let document: Table = toml::from_str(content)?;

    let defaults = match document.get(DEFAULT_SETTINGS_ID) {
        Some(Value::Table(table)) => table.clone(),
        Some(_) => {
            return Err(ConfigError::Validation(format!(
                "'{}' must be a table",
                DEFAULT_SETTINGS_ID
            )))
        }
        None => Table::new(),
    };

    let mut feeds = Vec::new();
    for (id, value) in document {
        if id == DEFAULT_SETTINGS_ID {
            continue;
        }

        let Value::Table(feed_table) = value else {
            return Err(ConfigError::Feed {
                feed: id,
                message: "expected a table of feed settings".to_string(),
            });
        };

        let mut merged = defaults.clone();
        merged.extend(feed_table);
        merged
            .entry("title")
            .or_insert_with(|| Value::String(id.clone()));

        let mut feed: FeedConfig =
            Value::Table(merged)
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::Feed {
                    feed: id.clone(),
                    message: e.to_string(),
                })?;
        feed.id = id;
        feeds.push(feed);
    }

    Ok(Config { feeds })
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration they used.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
