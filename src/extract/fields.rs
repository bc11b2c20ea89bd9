//! Field extraction from rendered entry fragments
//!
//! Every function here takes the entry container element and the field's
//! selectors and degrades to an absent value instead of failing. Whether
//! an entry with absent fields is acceptable is decided by the page fetcher.

use super::dates::{normalize_date, DateSource};
use super::link::resolve_link;
use super::{JOIN_SEPARATOR, WILDCARD_SELECTOR};
use crate::config::OneOrMany;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Resolves `selector` relative to `fragment`
///
/// The wildcard selects the fragment itself; anything else selects the first
/// matching descendant. Unparseable selectors match nothing.
pub fn select_first<'a>(fragment: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    if selector.trim() == WILDCARD_SELECTOR {
        return Some(fragment);
    }
    match Selector::parse(selector) {
        Ok(parsed) => fragment.select(&parsed).next(),
        Err(e) => {
            tracing::debug!("Ignoring unparseable selector '{}': {:?}", selector, e);
            None
        }
    }
}

/// Trimmed text content of `element`, or `None` if blank
fn text_of(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn join_values(values: Vec<String>) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(JOIN_SEPARATOR))
    }
}

/// Extracts the entry title
///
/// With several selectors, the non-empty texts are joined with
/// [`JOIN_SEPARATOR`].
pub fn extract_title(fragment: ElementRef<'_>, selectors: &OneOrMany) -> Option<String> {
    let titles = selectors
        .as_slice()
        .iter()
        .filter_map(|selector| select_first(fragment, selector).and_then(text_of))
        .collect();
    join_values(titles)
}

/// Extracts the entry body as HTML
///
/// Without a content selector the whole container is used. A selector that
/// matches nothing also falls back to the container.
pub fn extract_contents(fragment: ElementRef<'_>, selectors: Option<&OneOrMany>) -> String {
    let Some(selectors) = selectors else {
        return fragment.inner_html().trim().to_string();
    };

    let parts = selectors
        .as_slice()
        .iter()
        .map(|selector| {
            select_first(fragment, selector)
                .unwrap_or(fragment)
                .inner_html()
                .trim()
                .to_string()
        })
        .filter(|part| !part.is_empty())
        .collect();
    join_values(parts).unwrap_or_default()
}

/// Extracts the entry link from the `href` of the selected element
pub fn extract_link(fragment: ElementRef<'_>, selector: &str, base: &Url) -> Option<String> {
    let href = select_first(fragment, selector)?.value().attr("href")?;
    resolve_link(href, base).map(String::from)
}

/// Extracts the entry image
///
/// Uses the `src` attribute of the selected element, or the URL of an inline
/// `background-image` style when there is none.
pub fn extract_image(fragment: ElementRef<'_>, selector: &str, base: &Url) -> Option<String> {
    let element = select_first(fragment, selector)?;
    let raw = match element.value().attr("src") {
        Some(src) => src.trim().to_string(),
        None => background_image_url(element.value().attr("style")?)?,
    };
    if raw.is_empty() {
        return None;
    }
    base.join(&raw).ok().map(String::from)
}

/// Pulls the URL out of a `background-image: url(...)` declaration
fn background_image_url(style: &str) -> Option<String> {
    let value = style.split(';').find_map(|declaration| {
        let (property, value) = declaration.split_once(':')?;
        (property.trim().eq_ignore_ascii_case("background-image")).then(|| value.trim())
    })?;

    let inner = value.strip_prefix("url(")?.strip_suffix(')')?.trim();
    let unquoted = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(inner);
    Some(unquoted.to_string())
}

/// Extracts the entry date
///
/// A `datetime` attribute on the selected element wins over its text, which
/// is only used together with `format`. Falls back to `now`.
pub fn extract_date(
    fragment: ElementRef<'_>,
    selector: Option<&str>,
    format: Option<&str>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let Some(element) = selector.and_then(|selector| select_first(fragment, selector)) else {
        return now;
    };

    if let Some(marker) = element.value().attr("datetime") {
        return normalize_date(DateSource::Marker(marker), now);
    }

    match format {
        Some(format) => {
            let text = element.text().collect::<String>();
            normalize_date(DateSource::Text { text: &text, format }, now)
        }
        None => now,
    }
}

/// Finds the page favicon from `link[rel=icon]`, else `favicon.ico`
/// relative to the page URL
pub fn extract_favicon(document: &Html, base: &Url) -> Option<String> {
    let href = Selector::parse("link[rel~='icon'][href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .find_map(|element| element.value().attr("href"))
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "favicon.ico".to_string());

    base.join(&href).ok().map(String::from)
}
