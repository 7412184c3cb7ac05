//! Feed ingestion and timeline module for feedhub.
//!
//! - Fetching and parsing remote RSS/Atom feeds
//! - Idempotent, link-deduplicated post storage
//! - Scheduled and on-demand refreshes
//! - Per-subscriber merged timelines

pub mod aggregator;
pub mod fetcher;
pub mod ingest;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod trigger;
pub mod types;

pub use aggregator::{page_window, FeedAggregator, DEFAULT_MAX_LIMIT};
pub use fetcher::{parse_feed, validate_url, FeedSource, FetchError, HttpFeedSource};
pub use ingest::{IngestError, Ingestor};
pub use repository::{FeedRepository, PostRepository, SubscriptionRepository};
pub use scheduler::{FeedScheduler, TickReport};
pub use service::FeedService;
pub use store::{FeedStore, PostStore, SubscriptionStore};
pub use trigger::{RefreshTrigger, TriggerError};
pub use types::{
    Feed, FeedPage, InsertOutcome, NewFeed, NewPost, ParsedEntry, Post, RefreshSummary,
    Subscription,
};
