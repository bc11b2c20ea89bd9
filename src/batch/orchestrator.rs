use crate::config::{Config, FeedConfig, COMBINED_FEED_ID};
use crate::engine::Engine;
use crate::feed::FeedData;
use crate::fetch::{FeedFetcher, FeedOutcome};
use crate::navigation::RetryPolicy;
use crate::output::{FeedWriter, WrittenFeed};
use crate::reconcile::{reconcile, SnapshotCache};
use crate::{Result, ScottyError};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// URL the combined feed claims when no publishing root is known
const FALLBACK_ROOT_URL: &str = "https://example.com/";

/// What a batch run produced
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Written feeds in config order, the combined feed last
    pub written: Vec<WrittenFeed>,
    /// Feeds republished from their previous snapshot
    pub stale: Vec<String>,
    /// Feeds that produced no output
    pub excluded: Vec<String>,
    /// Feeds whose failure was suppressed in a scheduled run
    pub suppressed: Vec<String>,
}

impl BatchReport {
    /// Ids of every written feed
    pub fn written_ids(&self) -> Vec<&str> {
        self.written.iter().map(|w| w.feed_id.as_str()).collect()
    }
}

/// Runs every configured feed once and writes the results
pub struct Batch {
    config: Arc<Config>,
    engine: Arc<dyn Engine>,
    snapshots: Arc<SnapshotCache>,
    writer: FeedWriter,
    policy: RetryPolicy,
    scheduled: bool,
    concurrency: usize,
    root_url: Option<String>,
}

impl Batch {
    /// Creates a sequential, unscheduled batch
    pub fn new(
        config: Config,
        engine: Arc<dyn Engine>,
        snapshots: SnapshotCache,
        writer: FeedWriter,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            snapshots: Arc::new(snapshots),
            writer,
            policy: RetryPolicy::default(),
            scheduled: false,
            concurrency: 1,
            root_url: None,
        }
    }

    /// Marks the batch as an unattended scheduled run
    pub fn scheduled(mut self, scheduled: bool) -> Self {
        self.scheduled = scheduled;
        self
    }

    /// Number of feeds fetched at the same time, each with its own session
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Root URL the feeds are published at
    pub fn with_root_url(mut self, root_url: Option<String>) -> Self {
        self.root_url = root_url;
        self
    }

    /// Runs the batch
    ///
    /// Every feed is attempted and every successful feed is written before
    /// the first unsuppressed failure, if any, is returned.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchReport)` - All feeds were produced or their failures handled
    /// * `Err(ScottyError)` - The first feed failure that was not suppressed
    pub async fn run(&self) -> Result<BatchReport> {
        tracing::info!(
            "Fetching {} feeds ({} at a time{})",
            self.config.feeds.len(),
            self.concurrency,
            if self.scheduled { ", scheduled run" } else { "" }
        );

        let outcomes = self.fetch_all().await;

        let mut report = BatchReport::default();
        let mut first_error: Option<ScottyError> = None;
        let mut published: Vec<FeedData> = Vec::new();

        for (feed, outcome) in self.config.feeds.iter().zip(outcomes) {
            let step = match outcome {
                Ok(FeedOutcome::Fresh(fresh)) => {
                    let reconciled = reconcile(&self.snapshots, &feed.id, fresh).await;
                    self.publish(&feed.id, reconciled, &mut report, &mut published)
                        .await
                }
                Ok(FeedOutcome::Stale(previous)) => {
                    report.stale.push(feed.id.clone());
                    self.publish(&feed.id, previous, &mut report, &mut published)
                        .await
                }
                Ok(FeedOutcome::Excluded) => {
                    report.excluded.push(feed.id.clone());
                    Ok(())
                }
                Err(error) => self.handle_failure(feed, error, &mut report).await,
            };

            if let Err(error) = step {
                tracing::error!("Feed {} failed: {}", feed.id, error);
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }

        if let Err(error) = self.publish_combined(&published, &mut report).await {
            tracing::error!("Combined feed failed: {}", error);
            if first_error.is_none() {
                first_error = Some(error);
            }
        }

        tracing::info!(
            "Wrote {} feeds to {} ({} stale, {} excluded, {} suppressed)",
            report.written.len(),
            self.writer.dir().display(),
            report.stale.len(),
            report.excluded.len(),
            report.suppressed.len()
        );

        match first_error {
            Some(error) => Err(error),
            None => Ok(report),
        }
    }

    /// Fetches every feed, returning outcomes in config order
    async fn fetch_all(&self) -> Vec<Result<FeedOutcome>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, feed) in self.config.feeds.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let engine = Arc::clone(&self.engine);
            let snapshots = Arc::clone(&self.snapshots);
            let policy = self.policy;
            let feed = feed.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                tracing::debug!("Fetching feed {}", feed.id);
                let fetcher = FeedFetcher::new(engine.as_ref(), snapshots.as_ref()).with_policy(policy);
                (index, fetcher.fetch(&feed).await)
            });
        }

        let mut slots: Vec<Option<Result<FeedOutcome>>> =
            (0..self.config.feeds.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::error!("Feed task failed: {}", e),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Err(ScottyError::Engine("feed task did not complete".to_string())))
            })
            .collect()
    }

    /// Applies scheduled-run suppression to a failed feed
    async fn handle_failure(
        &self,
        feed: &FeedConfig,
        error: ScottyError,
        report: &mut BatchReport,
    ) -> Result<()> {
        if !self.scheduled {
            return Err(error);
        }

        let previous = match self.snapshots.get(&feed.id).await {
            Some(previous) if !previous.entries.is_empty() => previous,
            _ => return Err(error),
        };

        tracing::warn!(
            "Feed {} failed during a scheduled run ({}); it had {} entries before, so publishing an empty placeholder",
            feed.id,
            error,
            previous.entries.len()
        );
        let written = self.writer.write_placeholder(&feed.id, &previous).await?;
        report.written.push(written);
        report.suppressed.push(feed.id.clone());
        Ok(())
    }

    async fn publish(
        &self,
        feed_id: &str,
        feed: FeedData,
        report: &mut BatchReport,
        published: &mut Vec<FeedData>,
    ) -> Result<()> {
        let written = self.writer.write(feed_id, &feed).await?;
        tracing::info!("Wrote {} ({} entries)", written.xml_path.display(), written.entries);
        report.written.push(written);
        published.push(feed);
        Ok(())
    }

    async fn publish_combined(&self, feeds: &[FeedData], report: &mut BatchReport) -> Result<()> {
        let root = self.root_url.as_deref().unwrap_or(FALLBACK_ROOT_URL);
        let combined = FeedData::combine(feeds, format!("{}{}.xml", root, COMBINED_FEED_ID));
        let combined = reconcile(&self.snapshots, COMBINED_FEED_ID, combined).await;

        let written = self.writer.write(COMBINED_FEED_ID, &combined).await?;
        tracing::info!(
            "Wrote combined feed {} ({} entries)",
            written.xml_path.display(),
            written.entries
        );
        report.written.push(written);
        Ok(())
    }
}
