//! Background feed scheduler.
//!
//! Every interval the scheduler lists all feeds and refreshes them one after
//! another. A failing feed is logged and skipped; it never stops the tick or
//! the loop. The loop ends when the shutdown channel flips to `true` or its
//! sender is dropped.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::ingest::Ingestor;
use super::store::FeedStore;
use crate::Result;

/// Default refresh interval in seconds (5 minutes).
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Feeds listed at the start of the tick.
    pub feeds: usize,
    /// Feeds refreshed successfully.
    pub refreshed: usize,
    /// Feeds whose refresh failed.
    pub failed: usize,
    /// New posts across all feeds.
    pub inserted: usize,
}

/// Periodically refreshes every feed.
pub struct FeedScheduler {
    feeds: Arc<dyn FeedStore>,
    ingestor: Arc<Ingestor>,
    interval: Duration,
}

impl FeedScheduler {
    /// Create a scheduler with the default interval.
    pub fn new(feeds: Arc<dyn FeedStore>, ingestor: Arc<Ingestor>) -> Self {
        Self {
            feeds,
            ingestor,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
        }
    }

    /// Set the interval between ticks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// The interval between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until shutdown is signalled.
    ///
    /// The first tick fires one interval after start. Ticks never overlap:
    /// a slow tick delays the next one instead of stacking.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Feed scheduler started (interval: {} seconds)",
            self.interval.as_secs()
        );

        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = timer.tick() => {
                    if let Err(e) = self.run_tick().await {
                        error!("Failed to list feeds: {}", e);
                    }
                }
            }
        }

        info!("Feed scheduler stopped");
    }

    /// Refresh every feed once.
    ///
    /// Fails only if the feed list cannot be read. Per-feed failures are
    /// counted in the report.
    pub async fn run_tick(&self) -> Result<TickReport> {
        let feeds = self.feeds.list_all().await?;

        let mut report = TickReport {
            feeds: feeds.len(),
            ..TickReport::default()
        };

        if feeds.is_empty() {
            debug!("No feeds to refresh");
            return Ok(report);
        }

        info!("Refreshing {} feed(s)", feeds.len());

        for feed in &feeds {
            match self.ingestor.refresh_feed(feed).await {
                Ok(summary) => {
                    report.refreshed += 1;
                    report.inserted += summary.inserted;
                }
                Err(e) => {
                    warn!("Refresh of feed {} failed: {}", feed.id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Spawn the loop on the runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
