//! User model for feedhub.
//!
//! Users are the subscribers whose personalized timelines are served.
//! Credentials are handled outside this crate.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// User ID.
    pub id: i64,
    /// Unique username.
    pub username: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// New user for creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique username.
    pub username: String,
}

impl NewUser {
    /// Create a new user request.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user() {
        let user = NewUser::new("alice");
        assert_eq!(user.username, "alice");
    }
}
