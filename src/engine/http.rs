//! HTTP rendering engine
//!
//! Renders pages by fetching their server-side HTML:
//! - one `reqwest` client per session, with its own cookie store, so pages of a
//!   feed share session state the way a browser context does
//! - whole-request timeouts mapped onto the requested wait condition
//! - error classification into timeouts, transient aborts and hard failures
//!
//! Pages that build their content with JavaScript need a real browser behind
//! the [`Engine`] trait instead.

use crate::engine::{Engine, GotoOptions, Session};
use crate::{NavigationError, ScottyError};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!(
    "feed-scotty/",
    env!("CARGO_PKG_VERSION"),
    " (+https://feed-me-up-scotty.vincenttunru.com)"
);

/// Builds an HTTP client for one session
///
/// # Arguments
///
/// * `user_agent` - The user agent string to send
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Engine that renders pages with plain HTTP requests
#[derive(Debug, Clone)]
pub struct HttpEngine {
    user_agent: String,
}

impl HttpEngine {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl Default for HttpEngine {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

#[async_trait]
impl Engine for HttpEngine {
    async fn launch(&self) -> Result<Box<dyn Session>, ScottyError> {
        let client = build_http_client(&self.user_agent)?;
        tracing::debug!("Launched HTTP session");
        Ok(Box::new(HttpSession {
            client,
            current: None,
        }))
    }
}

/// A page loaded by an [`HttpSession`]
#[derive(Debug)]
struct LoadedPage {
    url: String,
    html: String,
}

/// A single browsing session backed by its own HTTP client
pub struct HttpSession {
    client: Client,
    current: Option<LoadedPage>,
}

#[async_trait]
impl Session for HttpSession {
    async fn goto(&mut self, url: &str, options: GotoOptions) -> Result<(), NavigationError> {
        // A failed navigation leaves no page behind
        self.current = None;

        let client = self.client.clone();
        let target = url.to_string();
        let request = async move {
            let response = client.get(&target).send().await?.error_for_status()?;
            let final_url = response.url().to_string();
            let html = response.text().await?;
            Ok::<_, reqwest::Error>(LoadedPage {
                url: final_url,
                html,
            })
        };

        match tokio::time::timeout(options.timeout, request).await {
            Ok(Ok(page)) => {
                tracing::debug!("Loaded {} ({} bytes)", page.url, page.html.len());
                self.current = Some(page);
                Ok(())
            }
            Ok(Err(e)) => Err(classify_error(&e, options)),
            Err(_) => Err(NavigationError::Timeout {
                wait_until: options.wait_until,
            }),
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), NavigationError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| NavigationError::Other(format!("invalid selector '{}': {:?}", selector, e)))?;

        // Server-rendered HTML never changes after loading, so either the
        // selector matches now or it never will.
        let found = self
            .content()
            .map(|html| Html::parse_document(html).select(&parsed).next().is_some())
            .unwrap_or(false);

        if found {
            Ok(())
        } else {
            Err(NavigationError::SelectorTimeout(selector.to_string()))
        }
    }

    fn content(&self) -> Option<&str> {
        self.current.as_ref().map(|page| page.html.as_str())
    }

    async fn close(&mut self) {
        if let Some(page) = self.current.take() {
            tracing::debug!("Closing HTTP session (last page: {})", page.url);
        }
    }
}

/// Maps a reqwest error onto the navigation error taxonomy
fn classify_error(error: &reqwest::Error, options: GotoOptions) -> NavigationError {
    if error.is_timeout() {
        NavigationError::Timeout {
            wait_until: options.wait_until,
        }
    } else if error.is_body() || error.is_decode() {
        NavigationError::Aborted(error.to_string())
    } else if let Some(status) = error.status() {
        NavigationError::Other(format!("HTTP {}", status.as_u16()))
    } else {
        NavigationError::Other(error.to_string())
    }
}
