use crate::config::types::{Config, FeedConfig};
use crate::extract::{compile_xpath, xpath_expression, WILDCARD_SELECTOR};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Feed id reserved for the combined feed
pub const COMBINED_FEED_ID: &str = "all";

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.feeds.is_empty() {
        return Err(ConfigError::Validation(
            "no feeds configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for feed in &config.feeds {
        if !seen.insert(feed.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "feed id '{}' is used more than once",
                feed.id
            )));
        }
        validate_feed(feed)?;
    }

    Ok(())
}

/// Validates a single feed's settings
pub fn validate_feed(feed: &FeedConfig) -> Result<(), ConfigError> {
    validate_feed_id(&feed.id)?;
    validate_urls(feed)?;

    validate_selector(&feed.entry_selector)?;
    for selector in feed.title_selector.as_slice() {
        validate_selector(selector)?;
    }
    if let Some(content_selector) = &feed.content_selector {
        for selector in content_selector.as_slice() {
            validate_selector(selector)?;
        }
    }
    if let Some(date_selector) = &feed.date_selector {
        validate_date_selector(date_selector)?;
    }
    for selector in [
        &feed.link_selector,
        &feed.image_selector,
        &feed.wait_for_selector,
    ]
    .into_iter()
    .flatten()
    {
        validate_selector(selector)?;
    }

    if feed.timeout == 0 {
        return Err(ConfigError::Feed {
            feed: feed.id.clone(),
            message: "timeout must be at least 1 second".to_string(),
        });
    }

    Ok(())
}

/// Validates a feed id: it names output files, so keep it path-safe
fn validate_feed_id(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::Validation(
            "feed id cannot be empty".to_string(),
        ));
    }

    if id == COMBINED_FEED_ID {
        return Err(ConfigError::Validation(format!(
            "feed id '{}' is reserved for the combined feed",
            COMBINED_FEED_ID
        )));
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "feed id must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            id
        )));
    }

    Ok(())
}

/// Validates that a feed has at least one absolute HTTP(S) URL
fn validate_urls(feed: &FeedConfig) -> Result<(), ConfigError> {
    if feed.urls().is_empty() {
        return Err(ConfigError::Feed {
            feed: feed.id.clone(),
            message: "at least one url is required".to_string(),
        });
    }

    for raw in feed.urls() {
        let url = Url::parse(raw)
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}' in feed '{}': {}", raw, feed.id, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "'{}' in feed '{}' must use http or https",
                raw, feed.id
            )));
        }
    }

    Ok(())
}

/// Validates a CSS selector (the wildcard is always accepted)
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    if selector == WILDCARD_SELECTOR {
        return Ok(());
    }

    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Validates a date selector: CSS, or an `xpathstr=` expression
fn validate_date_selector(selector: &str) -> Result<(), ConfigError> {
    match xpath_expression(selector) {
        Some(expression) => compile_xpath(expression)
            .map(|_| ())
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {}", selector, e))),
        None => validate_selector(selector),
    }
}
