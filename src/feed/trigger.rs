//! On-demand refresh of a single feed.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::ingest::{IngestError, Ingestor};
use super::store::FeedStore;
use super::types::RefreshSummary;
use crate::FeedhubError;

/// Errors from an on-demand refresh.
#[derive(Error, Debug)]
pub enum TriggerError {
    /// No feed has the requested ID.
    #[error("feed {0} not found")]
    NotFound(i64),

    /// The feed could not be looked up.
    #[error("feed lookup failed: {0}")]
    Lookup(FeedhubError),

    /// The refresh itself failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Runs a refresh for one feed outside the scheduler's cadence.
///
/// Triggers may overlap with each other and with a scheduled tick; the
/// post store's idempotent insert keeps the result free of duplicates.
#[derive(Clone)]
pub struct RefreshTrigger {
    feeds: Arc<dyn FeedStore>,
    ingestor: Arc<Ingestor>,
}

impl RefreshTrigger {
    /// Create a trigger.
    pub fn new(feeds: Arc<dyn FeedStore>, ingestor: Arc<Ingestor>) -> Self {
        Self { feeds, ingestor }
    }

    /// Refresh the feed with `feed_id` now and report what happened.
    pub async fn refresh_now(&self, feed_id: i64) -> Result<RefreshSummary, TriggerError> {
        let feed = self
            .feeds
            .get_by_id(feed_id)
            .await
            .map_err(TriggerError::Lookup)?
            .ok_or(TriggerError::NotFound(feed_id))?;

        info!("Manual refresh requested for feed {}", feed.id);
        Ok(self.ingestor.refresh_feed(&feed).await?)
    }
}
