use crate::config::FeedConfig;
use crate::engine::Session;
use crate::extract::{
    compile_xpath, extract_contents, extract_date, extract_image, extract_link, extract_title,
    extract_xpath_date, xpath_expression, XPathDocument,
};
use crate::feed::Entry;
use crate::navigation::{navigate, NavigationRequest, RetryPolicy};
use crate::{Result, ScottyError};
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use url::Url;

/// Navigates `session` to `url` with the feed's wait settings
pub async fn navigate_page(
    session: &mut dyn Session,
    url: &str,
    config: &FeedConfig,
    policy: &RetryPolicy,
) -> Result<()> {
    tracing::info!("Fetching {} for {}", url, config.id);

    let request = NavigationRequest {
        url,
        wait_until: config.wait_until,
        timeout: config.timeout(),
        wait_for_selector: config.wait_for_selector.as_deref(),
    };
    navigate(session, &request, policy)
        .await
        .map_err(|source| ScottyError::Navigation {
            url: url.to_string(),
            source,
        })?;
    Ok(())
}

/// Navigates to `url` and extracts every entry on it
///
/// Links are resolved against `base`, the feed's primary page.
pub async fn fetch_page_entries(
    session: &mut dyn Session,
    url: &str,
    base: &Url,
    config: &FeedConfig,
    policy: &RetryPolicy,
    now: DateTime<Utc>,
) -> Result<Vec<Entry>> {
    navigate_page(session, url, config, policy).await?;

    let document = Html::parse_document(session.content().unwrap_or_default());
    extract_entries(&document, url, base, config, now)
}

/// Extracts every entry container of a rendered page
///
/// # Arguments
///
/// * `document` - The rendered page
/// * `page_url` - URL of the page; the link of every entry when the feed has no link selector
/// * `base` - URL relative links and images are resolved against
/// * `config` - The feed's selectors
/// * `now` - Timestamp for entries without a usable date
///
/// # Returns
///
/// * `Ok(Vec<Entry>)` - Entries in document order
/// * `Err(ScottyError::MalformedEntry)` - An entry has neither a link nor a title
pub fn extract_entries(
    document: &Html,
    page_url: &str,
    base: &Url,
    config: &FeedConfig,
    now: DateTime<Utc>,
) -> Result<Vec<Entry>> {
    let selector = Selector::parse(&config.entry_selector).map_err(|e| ScottyError::Selector {
        selector: config.entry_selector.clone(),
        message: format!("{:?}", e),
    })?;

    let xpath_date = match config.date_selector.as_deref().and_then(xpath_expression) {
        Some(expression) => {
            let xpath = compile_xpath(expression).map_err(|message| ScottyError::Selector {
                selector: expression.to_string(),
                message,
            })?;
            Some((xpath, XPathDocument::parse(document)))
        }
        None => None,
    };

    document
        .select(&selector)
        .enumerate()
        .map(|(index, element)| {
            let title = extract_title(element, &config.title_selector);
            let contents = extract_contents(element, config.content_selector.as_ref());
            let link = match &config.link_selector {
                Some(selector) => extract_link(element, selector, base),
                None => Some(page_url.to_string()),
            };
            let retrieved = match &xpath_date {
                Some((xpath, xpath_document)) => extract_xpath_date(
                    element,
                    xpath_document,
                    xpath,
                    config.date_format.as_deref(),
                    now,
                ),
                None => extract_date(
                    element,
                    config.date_selector.as_deref(),
                    config.date_format.as_deref(),
                    now,
                ),
            };
            let image = config
                .image_selector
                .as_deref()
                .and_then(|selector| extract_image(element, selector, base));

            Entry::new(title, contents, link, retrieved, image).ok_or_else(|| {
                ScottyError::MalformedEntry {
                    feed: config.id.clone(),
                    url: page_url.to_string(),
                    index,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedEngine;
    use crate::engine::Engine;
    use crate::extract::identify;
    use crate::NavigationError;
    use chrono::TimeZone;
    use std::time::Duration;

    const URL: &str = "https://ex.com/";

    const LIST: &str = r#"<html><body><ul>
        <li><b>One</b><a href="/a">more</a><p>first</p></li>
        <li><b>Two</b><a href="/a">more</a><p>second</p></li>
        <li><b>Three</b><a href="/a">more</a><p>third</p></li>
    </ul></body></html>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn base() -> Url {
        Url::parse(URL).unwrap()
    }

    fn config() -> FeedConfig {
        let mut config = FeedConfig::new("news", URL, "li", "b");
        config.link_selector = Some("a".to_string());
        config
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            backoff_base: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_three_items_with_relative_links() {
        let document = Html::parse_document(LIST);
        let entries = extract_entries(&document, URL, &base(), &config(), now()).unwrap();

        assert_eq!(entries.len(), 3);
        for entry in &entries {
            assert_eq!(entry.link.as_deref(), Some("https://ex.com/a"));
            assert_eq!(entry.retrieved, now());
        }
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
        assert_eq!(entries[0].contents, "<b>One</b><a href=\"/a\">more</a><p>first</p>");
    }

    #[test]
    fn test_page_url_is_the_link_without_link_selector() {
        let document = Html::parse_document(LIST);
        let mut config = config();
        config.link_selector = None;

        let entries = extract_entries(&document, "https://ex.com/page/2", &base(), &config, now())
            .unwrap();
        assert!(entries
            .iter()
            .all(|e| e.link.as_deref() == Some("https://ex.com/page/2")));
    }

    #[test]
    fn test_title_identity_when_link_is_missing() {
        let document = Html::parse_document("<ul><li><b>Only a title</b></li></ul>");
        let entries = extract_entries(&document, URL, &base(), &config(), now()).unwrap();

        assert_eq!(entries[0].link, None);
        assert_eq!(entries[0].id, identify(None, Some("Only a title")).unwrap());
    }

    #[test]
    fn test_entry_without_link_or_title_is_an_error() {
        let document =
            Html::parse_document("<ul><li><b>ok</b></li><li><span>nothing</span></li></ul>");
        let error = extract_entries(&document, URL, &base(), &config(), now()).unwrap_err();

        match error {
            ScottyError::MalformedEntry { feed, url, index } => {
                assert_eq!(feed, "news");
                assert_eq!(url, URL);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_matches_is_empty() {
        let document = Html::parse_document("<p>nothing here</p>");
        let entries = extract_entries(&document, URL, &base(), &config(), now()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_optional_fields() {
        let html = r#"<ul><li>
            <b>Post</b>
            <time datetime="2024-02-03">3 Feb</time>
            <img src="/p.png">
        </li></ul>"#;
        let mut config = config();
        config.date_selector = Some("time".to_string());
        config.image_selector = Some("img".to_string());

        let document = Html::parse_document(html);
        let entries = extract_entries(&document, URL, &base(), &config, now()).unwrap();
        assert_eq!(
            entries[0].retrieved,
            Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap()
        );
        assert_eq!(entries[0].image.as_deref(), Some("https://ex.com/p.png"));
    }

    #[test]
    fn test_xpath_date_from_text_node() {
        let html = r#"<ul>
            <li><b>Old</b><p>Posted on 15/03/2024 by Ann</p></li>
            <li><b>Undated</b></li>
        </ul>"#;
        let mut config = config();
        config.date_selector = Some(
            "xpathstr=substring-before(substring-after(.//p/text(), 'Posted on '), ' by')"
                .to_string(),
        );
        config.date_format = Some("%d/%m/%Y".to_string());

        let document = Html::parse_document(html);
        let entries = extract_entries(&document, URL, &base(), &config, now()).unwrap();
        assert_eq!(
            entries[0].retrieved,
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(entries[1].retrieved, now());
    }

    #[test]
    fn test_broken_xpath_date_is_a_selector_error() {
        let mut config = config();
        config.date_selector = Some("xpathstr=substring-after(".to_string());

        let document = Html::parse_document(LIST);
        let error = extract_entries(&document, URL, &base(), &config, now()).unwrap_err();
        assert!(matches!(error, ScottyError::Selector { .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_entries_navigates() {
        let engine = ScriptedEngine::new().with_page(URL, LIST);
        let mut session = engine.launch().await.unwrap();

        let entries = fetch_page_entries(session.as_mut(), URL, &base(), &config(), &fast_policy(), now())
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(engine.gotos().len(), 1);
    }

    #[tokio::test]
    async fn test_navigation_failure_names_the_url() {
        let engine = ScriptedEngine::new();
        let mut session = engine.launch().await.unwrap();

        let error = fetch_page_entries(session.as_mut(), URL, &base(), &config(), &fast_policy(), now())
            .await
            .unwrap_err();

        match error {
            ScottyError::Navigation { url, source } => {
                assert_eq!(url, URL);
                assert_eq!(source, NavigationError::Other("HTTP 404".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
