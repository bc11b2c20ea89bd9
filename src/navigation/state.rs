//! Navigation state definitions
//!
//! One navigation moves through these states until it reaches a terminal one:
//!
//! ```text
//! Navigating ──ok──────────────────────────────▶ Succeeded
//!     │ timeout under load/networkidle (once) ──▶ Retrying ─▶ Navigating (domcontentloaded)
//!     │ transient abort, retries left ──────────▶ Retrying ─▶ Navigating (after backoff)
//!     │ transient abort, retries exhausted ─────▶ Suppressed
//!     └ anything else ──────────────────────────▶ Failed
//! ```

use crate::engine::WaitUntil;
use crate::NavigationError;
use std::time::Duration;

/// Retries allowed for transient aborts
pub const MAX_RETRIES: u32 = 3;

/// Delay before the first transient-abort retry; doubles on every retry
pub const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Bounds for transient-abort retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            backoff_base: BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (zero-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Represents the current state of one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    /// A `goto` is about to be issued
    Navigating {
        wait_until: WaitUntil,
        retries: u32,
        fell_back: bool,
    },

    /// Waiting before the next `goto`
    Retrying {
        wait_until: WaitUntil,
        retries: u32,
        fell_back: bool,
        delay: Duration,
    },

    /// The page reached its wait condition
    Succeeded,

    /// Transient aborts exhausted the retries; the page is used as loaded
    Suppressed(NavigationError),

    /// Navigation failed for good
    Failed(NavigationError),
}

impl NavigationState {
    /// Initial state for a navigation waiting for `wait_until`
    pub fn start(wait_until: WaitUntil) -> Self {
        Self::Navigating {
            wait_until,
            retries: 0,
            fell_back: false,
        }
    }

    /// Returns true if no further navigation will happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Suppressed(_) | Self::Failed(_))
    }

    /// Applies the result of a `goto` issued in the `Navigating` state
    ///
    /// Calling this in any other state leaves the state unchanged.
    pub fn on_attempt(self, result: Result<(), NavigationError>, policy: &RetryPolicy) -> Self {
        let (wait_until, retries, fell_back) = match self {
            Self::Navigating {
                wait_until,
                retries,
                fell_back,
            } => (wait_until, retries, fell_back),
            other => return other,
        };

        let error = match result {
            Ok(()) => return Self::Succeeded,
            Err(error) => error,
        };

        if error.is_timeout() && wait_until.is_strict() && !fell_back {
            return Self::Retrying {
                wait_until: WaitUntil::DomContentLoaded,
                retries,
                fell_back: true,
                delay: Duration::ZERO,
            };
        }

        if error.is_transient_abort() {
            if retries < policy.max_retries {
                return Self::Retrying {
                    wait_until,
                    retries: retries + 1,
                    fell_back,
                    delay: policy.backoff(retries),
                };
            }
            return Self::Suppressed(error);
        }

        Self::Failed(error)
    }

    /// Leaves the `Retrying` state once its delay has elapsed
    pub fn resume(self) -> Self {
        match self {
            Self::Retrying {
                wait_until,
                retries,
                fell_back,
                ..
            } => Self::Navigating {
                wait_until,
                retries,
                fell_back,
            },
            other => other,
        }
    }
}
