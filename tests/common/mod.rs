//! Test helpers shared by the integration tests.
//!
//! Provides an in-memory feed source, a post store that fails on demand,
//! and small setup helpers.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use feedhub::feed::{
    Feed, FeedRepository, FeedSource, FetchError, InsertOutcome, NewFeed, NewPost, ParsedEntry,
    Post, PostStore,
};
use feedhub::{Database, FeedhubError, Result};

/// Feed source serving canned entries per URL.
#[derive(Default)]
pub struct StubSource {
    entries: Mutex<HashMap<String, Vec<ParsedEntry>>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `entries` for `url`.
    pub fn set(&self, url: &str, entries: Vec<ParsedEntry>) {
        self.entries
            .lock()
            .unwrap()
            .insert(url.to_string(), entries);
    }

    /// Make fetches of `url` fail with a 503.
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for StubSource {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<ParsedEntry>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent refreshes interleave.
        tokio::task::yield_now().await;

        if self.failing.lock().unwrap().contains(url) {
            return Err(FetchError::Status(503));
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default())
    }
}

/// Post store that lets a fixed number of inserts through, then fails.
pub struct FlakyPostStore {
    inner: Arc<Database>,
    remaining: AtomicUsize,
}

impl FlakyPostStore {
    pub fn new(inner: Arc<Database>, allowed_inserts: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(allowed_inserts),
        }
    }
}

#[async_trait]
impl PostStore for FlakyPostStore {
    async fn find_by_link(&self, link: &str) -> Result<Option<Post>> {
        self.inner.find_by_link(link).await
    }

    async fn insert_if_absent(&self, post: &NewPost) -> Result<InsertOutcome> {
        let allowed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(FeedhubError::Database("disk I/O error".to_string()));
        }
        self.inner.insert_if_absent(post).await
    }

    async fn range_by_feed_ids(
        &self,
        feed_ids: &BTreeSet<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        self.inner.range_by_feed_ids(feed_ids, offset, limit).await
    }
}

/// Open a fresh in-memory database.
pub async fn memory_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().await.unwrap())
}

/// Register a feed.
pub async fn create_feed(db: &Database, url: &str) -> Feed {
    FeedRepository::new(db.pool())
        .create(&NewFeed::new(format!("Feed {}", url), url))
        .await
        .unwrap()
}

/// Fixed base time for deterministic timestamps.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// An entry published `minutes` after [`base_time`].
pub fn entry_at(link: &str, minutes: i64) -> ParsedEntry {
    ParsedEntry::new(format!("Post {}", link), link)
        .with_content(format!("Body of {}", link))
        .with_published_at(base_time() + chrono::Duration::minutes(minutes))
}
