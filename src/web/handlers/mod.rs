//! API handlers for the feedhub HTTP surface.

pub mod feed;
pub mod user;

pub use feed::*;
pub use user::*;

use axum::Json;
use std::sync::Arc;

use crate::config::TimelineConfig;
use crate::feed::{FeedAggregator, RefreshTrigger};
use crate::web::dto::HealthResponse;
use crate::Database;

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database handle for catalog operations.
    pub db: SharedDatabase,
    /// On-demand refresh entry point.
    pub trigger: RefreshTrigger,
    /// Timeline query engine.
    pub aggregator: FeedAggregator,
    /// Paging defaults.
    pub timeline: TimelineConfig,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: SharedDatabase,
        trigger: RefreshTrigger,
        aggregator: FeedAggregator,
        timeline: TimelineConfig,
    ) -> Self {
        Self {
            db,
            trigger,
            aggregator,
            timeline,
        }
    }
}

/// GET /healthz - Liveness probe.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
