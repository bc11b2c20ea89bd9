//! Navigation controller
//!
//! Drives a [`Session`](crate::engine::Session) to a URL with:
//! - a single fallback from strict wait conditions to `domcontentloaded`
//! - exponential backoff for transient aborts, suppressed once exhausted
//! - an optional wait-for-selector step after navigation

mod controller;
mod state;

pub use controller::{navigate, NavigationOutcome, NavigationRequest};
pub use state::{NavigationState, RetryPolicy, BACKOFF_BASE, MAX_RETRIES};
