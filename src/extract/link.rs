//! Link resolution with recovery for malformed `href` values

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Something that starts like `example.com` or `sub.example.co.uk`
fn domain_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)+")
            .expect("domain pattern is a valid regex")
    })
}

/// Resolves a raw `href` value against `base`
///
/// # Resolution Steps
///
/// 1. Resolve the trimmed value against `base`; values with interior
///    whitespace are rejected here
/// 2. Resolve the longest whitespace-delimited token against `base`
/// 3. If that token has no scheme but looks like a domain, assume `http://`
///
/// # Returns
///
/// * `Some(Url)` - The resolved URL
/// * `None` - Every attempt failed
///
/// # Examples
///
/// ```
/// use feed_scotty::extract::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://ex.com/list").unwrap();
/// let url = resolve_link("/a", &base).unwrap();
/// assert_eq!(url.as_str(), "https://ex.com/a");
/// ```
pub fn resolve_link(raw: &str, base: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let error = match join(raw, base) {
        Ok(url) => return Some(url),
        Err(error) => error,
    };

    let longest = raw
        .split_whitespace()
        .fold("", |longest, part| if part.len() > longest.len() { part } else { longest });
    tracing::debug!(
        "Parsing link \"{}\" failed ({}); trying longest part \"{}\"",
        raw,
        error,
        longest
    );

    match join(longest, base) {
        Ok(url) => Some(url),
        Err(_) if looks_like_domain(longest) => {
            tracing::debug!("\"{}\" looks like a domain without a scheme; assuming http://", longest);
            Url::parse(&format!("http://{}", longest)).ok()
        }
        Err(error) => {
            tracing::debug!("Longest part \"{}\" failed as well ({})", longest, error);
            None
        }
    }
}

fn join(raw: &str, base: &Url) -> Result<Url, String> {
    if raw.chars().any(char::is_whitespace) {
        return Err("contains whitespace".to_string());
    }
    base.join(raw).map_err(|e| e.to_string())
}

fn looks_like_domain(token: &str) -> bool {
    !token.is_empty()
        && !token.contains(':')
        && (token.to_ascii_lowercase().starts_with("www.") || domain_pattern().is_match(token))
}
