//! Response DTOs for Web API.

use serde::Serialize;

use crate::db::User;
use crate::feed::{Feed, FeedPage, Post, RefreshSummary, Subscription};

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok".
    pub status: &'static str,
}

/// Feed response.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    /// Feed ID.
    pub id: i64,
    /// Title.
    pub title: String,
    /// URL.
    pub url: String,
    /// Created at (ISO 8601).
    pub created_at: String,
    /// Last successful refresh (ISO 8601).
    pub last_fetched_at: Option<String>,
}

impl From<Feed> for FeedResponse {
    fn from(feed: Feed) -> Self {
        Self {
            id: feed.id,
            title: feed.title,
            url: feed.url,
            created_at: feed.created_at.to_rfc3339(),
            last_fetched_at: feed.last_fetched_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Post response.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    /// Post ID.
    pub id: i64,
    /// Feed the post was ingested from.
    pub feed_id: i64,
    /// Title.
    pub title: String,
    /// Canonical link.
    pub link: String,
    /// Content body.
    pub content: String,
    /// Published at (ISO 8601).
    pub published_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            feed_id: post.feed_id,
            title: post.title,
            link: post.link,
            content: post.content,
            published_at: post.published_at.to_rfc3339(),
        }
    }
}

/// Refresh result.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Refreshed feed.
    pub feed_id: i64,
    /// Entries processed.
    pub seen: usize,
    /// New posts stored.
    pub inserted: usize,
    /// Entries already stored.
    pub already_present: usize,
    /// Entries dropped for lacking a link.
    pub skipped: usize,
    /// Fetch time (ISO 8601).
    pub fetched_at: String,
}

impl From<RefreshSummary> for RefreshResponse {
    fn from(summary: RefreshSummary) -> Self {
        Self {
            feed_id: summary.feed_id,
            seen: summary.seen,
            inserted: summary.inserted,
            already_present: summary.already_present,
            skipped: summary.skipped,
            fetched_at: summary.fetched_at.to_rfc3339(),
        }
    }
}

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Created at (ISO 8601).
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Subscription response.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    /// Subscription ID.
    pub id: i64,
    /// Subscriber.
    pub user_id: i64,
    /// Followed feed.
    pub feed_id: i64,
    /// Created at (ISO 8601).
    pub created_at: String,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id,
            user_id: sub.user_id,
            feed_id: sub.feed_id,
            created_at: sub.created_at.to_rfc3339(),
        }
    }
}

/// A page of a subscriber's timeline.
#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    /// Page number.
    pub page: i64,
    /// Page size.
    pub limit: i64,
    /// Posts, newest first.
    pub posts: Vec<PostResponse>,
}

impl From<FeedPage> for TimelineResponse {
    fn from(page: FeedPage) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            posts: page.posts.into_iter().map(PostResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_timeline_response_shape() {
        let published = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let page = FeedPage {
            page: 2,
            limit: 1,
            posts: vec![Post {
                id: 9,
                feed_id: 1,
                title: "Hello".to_string(),
                link: "https://example.com/hello".to_string(),
                content: "Body".to_string(),
                published_at: published,
            }],
        };

        let json = serde_json::to_value(TimelineResponse::from(page)).unwrap();
        assert_eq!(json["page"], 2);
        assert_eq!(json["limit"], 1);
        assert_eq!(json["posts"][0]["id"], 9);
        assert_eq!(json["posts"][0]["published_at"], "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn test_feed_response_never_fetched() {
        let feed = Feed {
            id: 1,
            title: "Feed".to_string(),
            url: "https://example.com/feed".to_string(),
            created_at: Utc::now(),
            last_fetched_at: None,
        };
        let json = serde_json::to_value(FeedResponse::from(feed)).unwrap();
        assert!(json["last_fetched_at"].is_null());
    }
}
