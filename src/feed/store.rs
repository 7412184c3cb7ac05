//! Storage ports used by the ingestion pipeline and the aggregator.
//!
//! The engine, scheduler and aggregator depend on these traits rather than
//! on [`Database`] directly, so tests can substitute failing or in-memory
//! stores.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::repository::{FeedRepository, PostRepository, SubscriptionRepository};
use super::types::{Feed, InsertOutcome, NewPost, Post};
use crate::{Database, Result};

/// Feed catalog access.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// All feeds, in id order.
    async fn list_all(&self) -> Result<Vec<Feed>>;

    /// A single feed, if it exists.
    async fn get_by_id(&self, id: i64) -> Result<Option<Feed>>;

    /// Record the time of a successful refresh.
    async fn update_last_fetched(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
}

/// Post persistence, deduplicated on link.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Look up a post by its canonical link.
    async fn find_by_link(&self, link: &str) -> Result<Option<Post>>;

    /// Insert the post unless its link is already stored.
    async fn insert_if_absent(&self, post: &NewPost) -> Result<InsertOutcome>;

    /// Posts of the given feeds, newest first, windowed by offset and limit.
    async fn range_by_feed_ids(
        &self,
        feed_ids: &BTreeSet<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>>;
}

/// Subscriber-to-feed edges.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Feed IDs the subscriber follows.
    async fn feed_ids_for_subscriber(&self, subscriber_id: i64) -> Result<BTreeSet<i64>>;
}

#[async_trait]
impl FeedStore for Database {
    async fn list_all(&self) -> Result<Vec<Feed>> {
        FeedRepository::new(self.pool()).list_all().await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        FeedRepository::new(self.pool()).get_by_id(id).await
    }

    async fn update_last_fetched(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        FeedRepository::new(self.pool())
            .update_last_fetched(id, at)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PostStore for Database {
    async fn find_by_link(&self, link: &str) -> Result<Option<Post>> {
        PostRepository::new(self.pool()).find_by_link(link).await
    }

    async fn insert_if_absent(&self, post: &NewPost) -> Result<InsertOutcome> {
        PostRepository::new(self.pool()).insert_if_absent(post).await
    }

    async fn range_by_feed_ids(
        &self,
        feed_ids: &BTreeSet<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        PostRepository::new(self.pool())
            .list_by_feed_ids(feed_ids, offset, limit)
            .await
    }
}

#[async_trait]
impl SubscriptionStore for Database {
    async fn feed_ids_for_subscriber(&self, subscriber_id: i64) -> Result<BTreeSet<i64>> {
        SubscriptionRepository::new(self.pool())
            .feed_ids_for_user(subscriber_id)
            .await
    }
}
