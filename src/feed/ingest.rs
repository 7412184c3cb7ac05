//! Ingestion engine.
//!
//! One refresh fetches a feed, normalizes every entry into a candidate post
//! and commits each one through the idempotent insert of the [`PostStore`].
//! Running the same refresh twice, or two refreshes at once, never produces
//! a second post for the same link.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SubsecRound, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::fetcher::{FeedSource, FetchError};
use super::store::{FeedStore, PostStore};
use super::types::{Feed, NewPost, RefreshSummary};
use crate::FeedhubError;

/// Default bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Why a refresh did not complete.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The feed could not be fetched or parsed. Nothing was written.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] FetchError),

    /// A write failed mid-batch. Posts committed before the failure remain.
    #[error("store failure: {0}")]
    StoreFailure(#[from] FeedhubError),
}

/// Refreshes feeds into the post store.
pub struct Ingestor {
    source: Arc<dyn FeedSource>,
    feeds: Arc<dyn FeedStore>,
    posts: Arc<dyn PostStore>,
    fetch_timeout: Duration,
}

impl Ingestor {
    /// Create an ingestor with the default fetch timeout.
    pub fn new(
        source: Arc<dyn FeedSource>,
        feeds: Arc<dyn FeedStore>,
        posts: Arc<dyn PostStore>,
    ) -> Self {
        Self {
            source,
            feeds,
            posts,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    /// Set the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Refresh one feed.
    ///
    /// On success the feed's `last_fetched_at` is set to the fetch time and
    /// the counts are returned. On [`IngestError::SourceUnavailable`] no
    /// state is changed. On [`IngestError::StoreFailure`] the posts written
    /// before the failure stay committed and `last_fetched_at` is left
    /// untouched, so the next refresh resumes where this one stopped.
    pub async fn refresh_feed(&self, feed: &Feed) -> Result<RefreshSummary, IngestError> {
        debug!("Refreshing feed {}: {}", feed.id, feed.url);

        let entries = match tokio::time::timeout(self.fetch_timeout, self.source.fetch(&feed.url))
            .await
        {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                warn!("Failed to fetch feed {}: {}", feed.id, e);
                return Err(e.into());
            }
            Err(_) => {
                let e = FetchError::Timeout(self.fetch_timeout.as_secs());
                warn!("Failed to fetch feed {}: {}", feed.id, e);
                return Err(e.into());
            }
        };

        // Stored timestamps carry microsecond precision.
        let fetched_at = Utc::now().trunc_subsecs(6);
        let mut summary = RefreshSummary::new(feed.id, fetched_at);

        for entry in entries {
            summary.seen += 1;

            if entry.link.trim().is_empty() {
                debug!("Skipping entry without link in feed {}", feed.id);
                summary.skipped += 1;
                continue;
            }

            let candidate = NewPost::from_entry(feed.id, entry);
            match self.posts.insert_if_absent(&candidate).await {
                Ok(outcome) if outcome.inserted => summary.inserted += 1,
                Ok(_) => summary.already_present += 1,
                Err(e) => {
                    error!(
                        "Failed to store post {} for feed {}: {}",
                        candidate.link, feed.id, e
                    );
                    return Err(e.into());
                }
            }
        }

        if let Err(e) = self.feeds.update_last_fetched(feed.id, fetched_at).await {
            error!("Failed to update last fetched time for feed {}: {}", feed.id, e);
            return Err(e.into());
        }

        if summary.inserted > 0 {
            info!(
                "Feed {} refreshed: {} new post(s), {} already stored",
                feed.id, summary.inserted, summary.already_present
            );
        } else {
            debug!("Feed {} refreshed: no new posts", feed.id);
        }

        Ok(summary)
    }
}
