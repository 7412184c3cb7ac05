//! feedhub - Feed aggregator
//!
//! Fetches RSS/Atom feeds on a schedule or on demand, stores their entries
//! as link-deduplicated posts, and serves merged per-subscriber timelines.

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod web;

pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{FeedhubError, Result};
pub use feed::{
    FeedAggregator, FeedPage, FeedScheduler, FeedService, FeedSource, HttpFeedSource,
    IngestError, Ingestor, RefreshSummary, RefreshTrigger, TriggerError,
};
