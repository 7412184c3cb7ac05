//! Feed, post and subscription repositories for feedhub.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use super::types::{Feed, InsertOutcome, NewFeed, NewPost, Post, Subscription};
use crate::db::{
    format_datetime, is_foreign_key_violation, is_unique_violation, parse_datetime, stored_datetime,
    DbPool,
};
use crate::{FeedhubError, Result};

/// Row type for feeds.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedRow {
    id: i64,
    title: String,
    url: String,
    created_at: String,
    last_fetched_at: Option<String>,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            title: row.title,
            url: row.url,
            created_at: stored_datetime("feeds.created_at", &row.created_at),
            last_fetched_at: row.last_fetched_at.and_then(|s| parse_datetime(&s)),
        }
    }
}

/// Row type for posts.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PostRow {
    id: i64,
    feed_id: i64,
    title: String,
    link: String,
    content: String,
    published_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            feed_id: row.feed_id,
            title: row.title,
            link: row.link,
            content: row.content,
            published_at: stored_datetime("posts.published_at", &row.published_at),
        }
    }
}

/// Row type for subscriptions.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    user_id: i64,
    feed_id: i64,
    created_at: String,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Subscription {
            id: row.id,
            user_id: row.user_id,
            feed_id: row.feed_id,
            created_at: stored_datetime("subscriptions.created_at", &row.created_at),
        }
    }
}

const FEED_COLUMNS: &str = "id, title, url, created_at, last_fetched_at";
const POST_COLUMNS: &str = "id, feed_id, title, link, content, published_at";

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new feed.
    ///
    /// Returns [`FeedhubError::Conflict`] if the URL is already registered.
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO feeds (title, url, created_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&feed.title)
        .bind(&feed.url)
        .bind(format_datetime(&Utc::now()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                FeedhubError::Conflict(format!("feed url '{}' already exists", feed.url))
            } else {
                FeedhubError::from(e)
            }
        })?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FeedhubError::NotFound("feed".to_string()))
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {} FROM feeds WHERE id = $1",
            FEED_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {} FROM feeds WHERE url = $1",
            FEED_COLUMNS
        ))
        .bind(url)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Feed::from))
    }

    /// List all feeds in creation order.
    pub async fn list_all(&self) -> Result<Vec<Feed>> {
        let rows = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {} FROM feeds ORDER BY id ASC",
            FEED_COLUMNS
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Feed::from).collect())
    }

    /// Record a successful refresh.
    pub async fn update_last_fetched(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE feeds SET last_fetched_at = $1 WHERE id = $2")
            .bind(format_datetime(&at))
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count feeds.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a post unless one with the same link exists.
    ///
    /// The unique constraint on `link` decides the race between concurrent
    /// callers: exactly one of them inserts, the rest get the stored row
    /// back with `inserted == false`. Existing content is never overwritten.
    pub async fn insert_if_absent(&self, post: &NewPost) -> Result<InsertOutcome> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO posts (feed_id, title, link, content, published_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (link) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.link)
        .bind(&post.content)
        .bind(format_datetime(&post.published_at))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                FeedhubError::NotFound(format!("feed {}", post.feed_id))
            } else {
                FeedhubError::from(e)
            }
        })?;

        let (stored, inserted) = match id {
            Some(id) => (self.get_by_id(id).await?, true),
            None => (self.find_by_link(&post.link).await?, false),
        };

        let post = stored.ok_or_else(|| {
            FeedhubError::Database(format!("post with link '{}' vanished", post.link))
        })?;

        Ok(InsertOutcome { post, inserted })
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    /// Find a post by its canonical link.
    pub async fn find_by_link(&self, link: &str) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts WHERE link = $1",
            POST_COLUMNS
        ))
        .bind(link)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    /// List posts belonging to any of `feed_ids`, newest first.
    ///
    /// Ties on `published_at` are broken by descending id so paging is stable.
    pub async fn list_by_feed_ids(
        &self,
        feed_ids: &BTreeSet<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        if feed_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM posts WHERE feed_id IN (",
            POST_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for id in feed_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY published_at DESC, id DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// List the newest posts across all feeds.
    pub async fn list_latest(&self, limit: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts ORDER BY published_at DESC, id DESC LIMIT $1",
            POST_COLUMNS
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Count posts for a feed.
    pub async fn count_by_feed(&self, feed_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE feed_id = $1")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Count all posts.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Repository for subscription operations.
pub struct SubscriptionRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Subscribe a user to a feed. Idempotent on the (user, feed) pair.
    pub async fn create(&self, user_id: i64, feed_id: i64) -> Result<Subscription> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, feed_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, feed_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(format_datetime(&Utc::now()))
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                FeedhubError::NotFound(format!("user {} or feed {}", user_id, feed_id))
            } else {
                FeedhubError::from(e)
            }
        })?;

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, feed_id, created_at
            FROM subscriptions
            WHERE user_id = $1 AND feed_id = $2
            "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .fetch_one(self.pool)
        .await?;

        Ok(Subscription::from(row))
    }

    /// Feed IDs a user is subscribed to.
    pub async fn feed_ids_for_user(&self, user_id: i64) -> Result<BTreeSet<i64>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT feed_id FROM subscriptions WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(self.pool)
                .await?;

        Ok(ids.into_iter().collect())
    }

    /// List a user's subscriptions.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, feed_id, created_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Subscription::from).collect())
    }
}
