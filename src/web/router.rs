//! Router configuration for Web API.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_feed, create_user, get_timeline, health_check, list_feeds, list_latest_posts,
    list_subscriptions, refresh_feed, subscribe, AppState,
};
use super::middleware::create_cors_layer;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let feed_routes = Router::new()
        .route("/feeds", post(create_feed).get(list_feeds))
        .route("/feeds/refresh", post(refresh_feed))
        .route("/posts", get(list_latest_posts));

    let user_routes = Router::new()
        .route("/users", post(create_user))
        .route("/users/:id/feed", get(get_timeline))
        .route("/users/:id/subscriptions", get(list_subscriptions))
        .route("/subscriptions", post(subscribe));

    Router::new()
        .merge(feed_routes)
        .merge(user_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/healthz", get(health_check))
}
