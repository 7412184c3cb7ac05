//! User repository for feedhub.

use chrono::Utc;

use super::user::{NewUser, User};
use super::{format_datetime, is_unique_violation, stored_datetime, DbPool};
use crate::{FeedhubError, Result};

/// Row type for users.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            created_at: stored_datetime("users.created_at", &row.created_at),
        }
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Returns [`FeedhubError::Conflict`] if the username is taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (username, created_at) VALUES ($1, $2)")
            .bind(&new_user.username)
            .bind(format_datetime(&Utc::now()))
            .execute(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    FeedhubError::Conflict(format!(
                        "username '{}' already exists",
                        new_user.username
                    ))
                } else {
                    FeedhubError::from(e)
                }
            })?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| FeedhubError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}
