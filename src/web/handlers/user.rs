//! User and subscription handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::feed::FeedService;
use crate::web::dto::{
    ApiResponse, CreateUserRequest, SubscribeRequest, SubscriptionResponse, UserResponse,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /users - Register a subscriber.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let user = FeedService::new(&state.db)
        .create_user(&req.username)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UserResponse::from(user))),
    ))
}

/// POST /subscriptions - Follow a feed.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubscriptionResponse>>), ApiError> {
    let sub = FeedService::new(&state.db)
        .subscribe(req.user_id, req.feed_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(SubscriptionResponse::from(sub))),
    ))
}

/// GET /users/:id/subscriptions - List a subscriber's feeds.
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<SubscriptionResponse>>>, ApiError> {
    let subs = FeedService::new(&state.db)
        .list_subscriptions(user_id)
        .await?;

    Ok(Json(ApiResponse::new(
        subs.into_iter().map(SubscriptionResponse::from).collect(),
    )))
}
