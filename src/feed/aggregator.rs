//! Personalized feed aggregator.
//!
//! Merges the posts of every feed a subscriber follows into a single
//! timeline, newest first, and serves it a page at a time.

use std::sync::Arc;

use super::store::{PostStore, SubscriptionStore};
use super::types::FeedPage;
use crate::Result;

/// Upper bound on page size when none is configured.
pub const DEFAULT_MAX_LIMIT: i64 = 100;

/// Clamp a requested page and limit, returning `(page, limit, offset)`.
///
/// Page is at least 1. Limit falls in `1..=max_limit`.
pub fn page_window(page: i64, limit: i64, max_limit: i64) -> (i64, i64, i64) {
    let page = page.max(1);
    let limit = limit.clamp(1, max_limit.max(1));
    let offset = (page - 1).saturating_mul(limit);
    (page, limit, offset)
}

/// Serves per-subscriber timelines.
#[derive(Clone)]
pub struct FeedAggregator {
    subscriptions: Arc<dyn SubscriptionStore>,
    posts: Arc<dyn PostStore>,
    max_limit: i64,
}

impl FeedAggregator {
    /// Create an aggregator.
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, posts: Arc<dyn PostStore>) -> Self {
        Self {
            subscriptions,
            posts,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }

    /// Set the page size cap.
    pub fn with_max_limit(mut self, max_limit: i64) -> Self {
        self.max_limit = max_limit;
        self
    }

    /// One page of the subscriber's merged timeline.
    ///
    /// A subscriber with no subscriptions gets an empty page, not an error.
    pub async fn get_feed(&self, subscriber_id: i64, page: i64, limit: i64) -> Result<FeedPage> {
        let (page, limit, offset) = page_window(page, limit, self.max_limit);

        let feed_ids = self
            .subscriptions
            .feed_ids_for_subscriber(subscriber_id)
            .await?;

        let posts = if feed_ids.is_empty() {
            Vec::new()
        } else {
            self.posts
                .range_by_feed_ids(&feed_ids, offset, limit)
                .await?
        };

        Ok(FeedPage { page, limit, posts })
    }
}
