//! Catalog operations: feeds, subscribers and subscriptions.

use super::repository::{FeedRepository, PostRepository, SubscriptionRepository};
use super::types::{Feed, NewFeed, Post, Subscription};
use crate::db::{Database, NewUser, User, UserRepository};
use crate::{FeedhubError, Result};

/// Maximum length of a feed title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a username.
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Service for feed catalog operations.
pub struct FeedService<'a> {
    db: &'a Database,
}

impl<'a> FeedService<'a> {
    /// Create a new FeedService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a feed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The title is empty or too long
    /// - The URL is not an absolute http or https URL
    /// - A feed with the same URL already exists
    pub async fn create_feed(&self, title: &str, url: &str) -> Result<Feed> {
        let title = title.trim();
        if title.is_empty() {
            return Err(FeedhubError::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(FeedhubError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LENGTH
            )));
        }

        let url = url.trim();
        let parsed = url::Url::parse(url)
            .map_err(|e| FeedhubError::Validation(format!("invalid url: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host().is_none() {
            return Err(FeedhubError::Validation(
                "url must be an http or https URL".to_string(),
            ));
        }

        FeedRepository::new(self.db.pool())
            .create(&NewFeed::new(title, url))
            .await
    }

    /// List all feeds.
    pub async fn list_feeds(&self) -> Result<Vec<Feed>> {
        FeedRepository::new(self.db.pool()).list_all().await
    }

    /// Get a feed by ID.
    pub async fn get_feed(&self, id: i64) -> Result<Feed> {
        FeedRepository::new(self.db.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| FeedhubError::NotFound(format!("feed {}", id)))
    }

    /// The newest posts across every feed.
    pub async fn list_latest_posts(&self, limit: i64) -> Result<Vec<Post>> {
        PostRepository::new(self.db.pool())
            .list_latest(limit.max(1))
            .await
    }

    /// Register a subscriber.
    pub async fn create_user(&self, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(FeedhubError::Validation("username is required".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(FeedhubError::Validation(format!(
                "username must be at most {} characters",
                MAX_USERNAME_LENGTH
            )));
        }

        UserRepository::new(self.db.pool())
            .create(&NewUser::new(username))
            .await
    }

    /// Subscribe a user to a feed. Subscribing twice is a no-op.
    pub async fn subscribe(&self, user_id: i64, feed_id: i64) -> Result<Subscription> {
        if UserRepository::new(self.db.pool())
            .get_by_id(user_id)
            .await?
            .is_none()
        {
            return Err(FeedhubError::NotFound(format!("user {}", user_id)));
        }
        self.get_feed(feed_id).await?;

        SubscriptionRepository::new(self.db.pool())
            .create(user_id, feed_id)
            .await
    }

    /// List a user's subscriptions.
    pub async fn list_subscriptions(&self, user_id: i64) -> Result<Vec<Subscription>> {
        SubscriptionRepository::new(self.db.pool())
            .list_by_user(user_id)
            .await
    }
}
