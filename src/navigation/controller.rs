use crate::engine::{GotoOptions, Session, WaitUntil};
use crate::navigation::state::{NavigationState, RetryPolicy};
use crate::NavigationError;
use std::time::Duration;

/// Where to navigate and how long to wait
#[derive(Debug, Clone, Copy)]
pub struct NavigationRequest<'a> {
    pub url: &'a str,
    pub wait_until: WaitUntil,
    pub timeout: Duration,
    pub wait_for_selector: Option<&'a str>,
}

/// How a navigation that did not fail ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The page reached its wait condition
    Succeeded,
    /// Transient aborts were suppressed; the page may be partially loaded
    Suppressed(NavigationError),
}

/// Navigates `session` according to `request`, retrying per `policy`
///
/// # Returns
///
/// * `Ok(NavigationOutcome)` - The page can be queried
/// * `Err(NavigationError)` - Navigation or the wait-for-selector step failed
pub async fn navigate(
    session: &mut dyn Session,
    request: &NavigationRequest<'_>,
    policy: &RetryPolicy,
) -> Result<NavigationOutcome, NavigationError> {
    let mut state = NavigationState::start(request.wait_until);

    let outcome = loop {
        match &state {
            NavigationState::Navigating { wait_until, .. } => {
                let options = GotoOptions {
                    timeout: request.timeout,
                    wait_until: *wait_until,
                };
                let result = session.goto(request.url, options).await;
                state = state.on_attempt(result, policy);
            }

            NavigationState::Retrying {
                wait_until,
                retries,
                fell_back,
                delay,
            } => {
                if *fell_back && delay.is_zero() {
                    tracing::warn!(
                        "Timed out waiting for {} on {}; retrying with {}",
                        request.wait_until,
                        request.url,
                        wait_until
                    );
                } else {
                    tracing::warn!(
                        "Navigation to {} was aborted; retry {}/{} in {:?}",
                        request.url,
                        retries,
                        policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(*delay).await;
                }
                state = state.resume();
            }

            NavigationState::Succeeded => break NavigationOutcome::Succeeded,

            NavigationState::Suppressed(error) => {
                tracing::warn!(
                    "Navigation to {} kept failing ({}); continuing with what loaded",
                    request.url,
                    error
                );
                break NavigationOutcome::Suppressed(error.clone());
            }

            NavigationState::Failed(error) => return Err(error.clone()),
        }
    };

    if let Some(selector) = request.wait_for_selector {
        session.wait_for_selector(selector, request.timeout).await?;
    }

    Ok(outcome)
}
