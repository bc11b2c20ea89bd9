use crate::config::{FeedConfig, OnFail};
use crate::engine::{Engine, Session};
use crate::extract::extract_favicon;
use crate::feed::FeedData;
use crate::fetch::filters::apply_filters;
use crate::fetch::page::{extract_entries, fetch_page_entries, navigate_page};
use crate::navigation::RetryPolicy;
use crate::reconcile::SnapshotCache;
use crate::{Result, ScottyError};
use chrono::Utc;
use scraper::Html;
use url::Url;

/// Result of fetching one feed after its failure policy has been applied
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome {
    /// Freshly scraped data
    Fresh(FeedData),
    /// The fetch failed and the previous snapshot stands in for it
    Stale(FeedData),
    /// The fetch failed and the feed produces no output
    Excluded,
}

/// Fetches feeds, one rendering session per fetch
pub struct FeedFetcher<'a> {
    engine: &'a dyn Engine,
    snapshots: &'a SnapshotCache,
    policy: RetryPolicy,
}

impl<'a> FeedFetcher<'a> {
    pub fn new(engine: &'a dyn Engine, snapshots: &'a SnapshotCache) -> Self {
        Self {
            engine,
            snapshots,
            policy: RetryPolicy::default(),
        }
    }

    /// Overrides the navigation retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetches `config` and applies its `onFail` policy to any error
    ///
    /// # Returns
    ///
    /// * `Ok(FeedOutcome)` - Fresh data, or the outcome of the failure policy
    /// * `Err(ScottyError)` - The fetch failed and the policy is `error`
    pub async fn fetch(&self, config: &FeedConfig) -> Result<FeedOutcome> {
        let error = match self.fetch_fresh(config).await {
            Ok(feed) => return Ok(FeedOutcome::Fresh(feed)),
            Err(error) => error,
        };

        match config.on_fail {
            OnFail::Error => Err(error),

            OnFail::Stale => match self.snapshots.get(&config.id).await {
                Some(previous) => {
                    tracing::warn!(
                        "Could not fetch {} ({}); preserving existing feed",
                        config.id,
                        error
                    );
                    Ok(FeedOutcome::Stale(previous.as_ref().clone()))
                }
                None => {
                    tracing::warn!(
                        "Could not fetch {} ({}) and there is no existing feed; not generating it",
                        config.id,
                        error
                    );
                    Ok(FeedOutcome::Excluded)
                }
            },

            OnFail::Exclude => {
                tracing::warn!(
                    "Could not fetch {} ({}); not generating its feed",
                    config.id,
                    error
                );
                Ok(FeedOutcome::Excluded)
            }
        }
    }

    /// Fetches `config` without applying its failure policy
    ///
    /// The session is closed on every path.
    pub async fn fetch_fresh(&self, config: &FeedConfig) -> Result<FeedData> {
        let mut session = self.engine.launch().await?;
        let result = self.fetch_with_session(session.as_mut(), config).await;
        session.close().await;
        result
    }

    async fn fetch_with_session(
        &self,
        session: &mut dyn Session,
        config: &FeedConfig,
    ) -> Result<FeedData> {
        let primary = config.primary_url();
        let base = Url::parse(primary)?;
        let now = Utc::now();

        navigate_page(session, primary, config, &self.policy).await?;
        let (favicon, mut entries) = {
            let document = Html::parse_document(session.content().unwrap_or_default());
            let favicon = extract_favicon(&document, &base);
            (favicon, extract_entries(&document, primary, &base, config, now)?)
        };

        // Later pages reuse the session (and its cookies) of the primary page
        for url in config.urls().iter().skip(1) {
            let page_entries =
                fetch_page_entries(session, url, &base, config, &self.policy, now).await?;
            entries.extend(page_entries);
        }

        tracing::info!("Fetched {} ({} entries)", config.id, entries.len());

        let entries = apply_filters(entries, config);
        tracing::info!(
            "Applied filters and matchers to {}, final count: {} entries",
            config.id,
            entries.len()
        );

        if entries.is_empty() {
            return Err(ScottyError::EmptyFeed {
                feed: config.id.clone(),
            });
        }

        Ok(FeedData {
            title: config.title.clone(),
            url: primary.to_string(),
            favicon,
            entries,
        })
    }
}
