//! Rendering engine contract
//!
//! The pipeline never talks to a browser directly. It launches a [`Session`]
//! (one browser, one context, one page) from an [`Engine`], navigates it, and
//! queries the rendered HTML with CSS selectors. Sessions are owned by exactly
//! one feed fetch at a time and closed when that fetch ends.

mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use http::{build_http_client, HttpEngine, HttpSession, DEFAULT_USER_AGENT};

use crate::{NavigationError, ScottyError};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Page readiness criterion used to decide when navigation is complete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    /// The `load` event fired
    Load,
    /// The DOM has been parsed
    #[default]
    DomContentLoaded,
    /// No network activity for a while
    NetworkIdle,
    /// The response has started arriving
    Commit,
}

impl WaitUntil {
    /// Returns true for conditions that many pages never reach
    /// (long-polling, analytics beacons) and that can fall back to
    /// [`WaitUntil::DomContentLoaded`].
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Load | Self::NetworkIdle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle => "networkidle",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a single navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GotoOptions {
    pub timeout: Duration,
    pub wait_until: WaitUntil,
}

/// Launches rendering sessions
#[async_trait]
pub trait Engine: Send + Sync {
    /// Launches a fresh browser with a single context and page
    async fn launch(&self) -> Result<Box<dyn Session>, ScottyError>;
}

/// A launched browser page
#[async_trait]
pub trait Session: Send {
    /// Navigates to `url` and waits for `options.wait_until`
    async fn goto(&mut self, url: &str, options: GotoOptions) -> Result<(), NavigationError>;

    /// Waits until `selector` matches something on the current page
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), NavigationError>;

    /// Rendered HTML of the current page, if a navigation completed
    fn content(&self) -> Option<&str>;

    /// Tears the browser down
    async fn close(&mut self);
}
