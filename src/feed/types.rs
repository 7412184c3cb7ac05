//! Feed, post and subscription types for feedhub.

use chrono::{DateTime, SubsecRound, Utc};

use crate::db::clamp_storable;

/// A subscribable remote syndication source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// Feed title.
    pub title: String,
    /// Canonical feed URL (unique).
    pub url: String,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
    /// Last successful refresh, if any.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl Feed {
    /// Whether the feed has never been refreshed successfully.
    pub fn is_never_fetched(&self) -> bool {
        self.last_fetched_at.is_none()
    }
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Feed title.
    pub title: String,
    /// Feed URL.
    pub url: String,
}

impl NewFeed {
    /// Create a new feed request.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A normalized, deduplicated entry attributed to a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Post ID.
    pub id: i64,
    /// Feed this post was ingested from.
    pub feed_id: i64,
    /// Post title.
    pub title: String,
    /// Canonical link, unique across all posts.
    pub link: String,
    /// Content body.
    pub content: String,
    /// Publication time.
    pub published_at: DateTime<Utc>,
}

/// Candidate post, keyed by its link.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Feed ID.
    pub feed_id: i64,
    /// Post title.
    pub title: String,
    /// Canonical link.
    pub link: String,
    /// Content body.
    pub content: String,
    /// Publication time.
    pub published_at: DateTime<Utc>,
}

impl NewPost {
    /// Create a candidate post published now.
    pub fn new(feed_id: i64, link: impl Into<String>) -> Self {
        Self {
            feed_id,
            title: String::new(),
            link: link.into(),
            content: String::new(),
            published_at: Utc::now(),
        }
    }

    /// Normalize a fetched entry into a candidate post.
    ///
    /// Entries without a publication time are stamped with the current time.
    /// Dates outside years 0000 through 9999 are clamped into that range.
    pub fn from_entry(feed_id: i64, entry: ParsedEntry) -> Self {
        Self {
            feed_id,
            title: entry.title,
            link: entry.link,
            content: entry.content,
            published_at: entry
                .published_at
                .map(clamp_storable)
                .unwrap_or_else(|| Utc::now().trunc_subsecs(6)),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = published_at;
        self
    }
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    /// The stored post (newly inserted or pre-existing).
    pub post: Post,
    /// Whether this call created the row.
    pub inserted: bool,
}

/// One entry as returned by a feed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    /// Entry title.
    pub title: String,
    /// Link to the original article.
    pub link: String,
    /// Content body.
    pub content: String,
    /// Publication time, if the feed carries one.
    pub published_at: Option<DateTime<Utc>>,
}

impl ParsedEntry {
    /// Create an entry with a link and title.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            content: String::new(),
            published_at: None,
        }
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// A subscriber-to-feed edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Subscription ID.
    pub id: i64,
    /// Subscriber (user) ID.
    pub user_id: i64,
    /// Feed ID.
    pub feed_id: i64,
    /// When the subscription was created.
    pub created_at: DateTime<Utc>,
}

/// Counts reported by one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Refreshed feed.
    pub feed_id: i64,
    /// Entries processed from the fetched document.
    pub seen: usize,
    /// Entries stored as new posts.
    pub inserted: usize,
    /// Entries whose link was already stored.
    pub already_present: usize,
    /// Entries dropped for lacking a link.
    pub skipped: usize,
    /// When the document was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl RefreshSummary {
    /// Create an empty summary.
    pub fn new(feed_id: i64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            feed_id,
            seen: 0,
            inserted: 0,
            already_present: 0,
            skipped: 0,
            fetched_at,
        }
    }
}

/// One page of a subscriber's merged timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    /// Page number (1-based, after clamping).
    pub page: i64,
    /// Page size (after clamping).
    pub limit: i64,
    /// Posts, newest first.
    pub posts: Vec<Post>,
}
