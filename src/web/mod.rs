//! Web API module for feedhub.
//!
//! A thin HTTP surface over the catalog, the on-demand refresh trigger and
//! the timeline aggregator.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
