//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Feed registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedRequest {
    /// Display title.
    #[validate(
        length(max = 200, message = "Must be at most 200 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub title: String,
    /// Feed URL.
    #[validate(url(message = "Must be a valid URL"))]
    pub url: String,
}

/// On-demand refresh request.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshFeedRequest {
    /// Feed to refresh.
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub feed_id: i64,
}

/// Subscriber registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Username.
    #[validate(
        length(min = 1, max = 64, message = "Must be 1 to 64 characters"),
        custom(function = "no_control_chars")
    )]
    pub username: String,
}

/// Subscription request.
#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    /// Subscriber.
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub user_id: i64,
    /// Feed to follow.
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub feed_id: i64,
}

/// Timeline paging parameters.
#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    /// Page number, 1-based.
    pub page: Option<i64>,
    /// Page size.
    pub limit: Option<i64>,
}
