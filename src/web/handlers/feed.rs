//! Feed, refresh and timeline handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::feed::FeedService;
use crate::web::dto::{
    ApiResponse, CreateFeedRequest, FeedResponse, PostResponse, RefreshFeedRequest,
    RefreshResponse, TimelineQuery, TimelineResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /feeds - Register a feed.
pub async fn create_feed(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateFeedRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FeedResponse>>), ApiError> {
    let feed = FeedService::new(&state.db)
        .create_feed(&req.title, &req.url)
        .await?;

    tracing::info!(feed_id = feed.id, url = %feed.url, "Feed created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FeedResponse::from(feed))),
    ))
}

/// GET /feeds - List all feeds.
pub async fn list_feeds(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<FeedResponse>>>, ApiError> {
    let feeds = FeedService::new(&state.db).list_feeds().await?;

    Ok(Json(ApiResponse::new(
        feeds.into_iter().map(FeedResponse::from).collect(),
    )))
}

/// POST /feeds/refresh - Refresh one feed now.
pub async fn refresh_feed(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshFeedRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let summary = state.trigger.refresh_now(req.feed_id).await?;

    Ok(Json(ApiResponse::new(RefreshResponse::from(summary))))
}

/// GET /posts - Newest posts across all feeds.
pub async fn list_latest_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<PostResponse>>>, ApiError> {
    let posts = FeedService::new(&state.db)
        .list_latest_posts(state.timeline.latest_posts_limit)
        .await?;

    Ok(Json(ApiResponse::new(
        posts.into_iter().map(PostResponse::from).collect(),
    )))
}

/// GET /users/:id/feed - A subscriber's merged timeline.
pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<ApiResponse<TimelineResponse>>, ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(state.timeline.default_limit);

    let page = state.aggregator.get_feed(user_id, page, limit).await?;

    Ok(Json(ApiResponse::new(TimelineResponse::from(page))))
}
