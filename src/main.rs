use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use feedhub::config::Config;
use feedhub::feed::{FeedAggregator, FeedScheduler, HttpFeedSource, Ingestor, RefreshTrigger};
use feedhub::web::{AppState, WebServer};
use feedhub::Database;

#[tokio::main]
async fn main() {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging; must precede env overrides
    if let Err(e) = feedhub::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        feedhub::logging::init_console_only(&config.logging.level);
    }

    config.apply_env_overrides();

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("feedhub - feed aggregator");

    if let Err(e) = run(config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> feedhub::Result<()> {
    let db = Arc::new(Database::open(&config.database.path, config.database.max_connections).await?);
    info!("Database opened at {}", config.database.path);

    let source = HttpFeedSource::new(&config.fetch)
        .map_err(|e| feedhub::FeedhubError::Config(e.to_string()))?;
    let ingestor = Arc::new(
        Ingestor::new(Arc::new(source), db.clone(), db.clone())
            .with_fetch_timeout(Duration::from_secs(config.fetch.total_timeout_secs)),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = if config.scheduler.enabled {
        let scheduler = FeedScheduler::new(db.clone(), ingestor.clone())
            .with_interval(Duration::from_secs(config.scheduler.interval_secs));
        Some(scheduler.spawn(shutdown_rx))
    } else {
        info!("Feed scheduler disabled");
        None
    };

    let state = AppState::new(
        db.clone(),
        RefreshTrigger::new(db.clone(), ingestor),
        FeedAggregator::new(db.clone(), db.clone()).with_max_limit(config.timeline.max_limit),
        config.timeline.clone(),
    );

    let server = WebServer::new(&config.server, state)?;
    let served = server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await;

    // Receivers may already be gone if the scheduler is disabled.
    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler {
        if let Err(e) = handle.await {
            error!("Feed scheduler task failed: {}", e);
        }
    }

    db.close().await;
    info!("feedhub stopped");

    served.map_err(feedhub::FeedhubError::from)
}
