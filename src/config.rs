//! Configuration module for feedhub.

use serde::Deserialize;
use std::path::Path;

use crate::{FeedhubError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins (empty allows any origin).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/feedhub.db".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_db_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/feedhub.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Remote feed fetching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed document size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Maximum post content length in characters.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    /// User agent sent with feed requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Allow feeds hosted on private or loopback addresses.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_content_length() -> usize {
    10000
}

fn default_user_agent() -> String {
    "feedhub/0.1 (feed aggregator)".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
            max_content_length: default_max_content_length(),
            user_agent: default_user_agent(),
            allow_private_hosts: false,
        }
    }
}

/// Background refresh scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the background scheduler runs.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    /// Tick interval in seconds.
    #[serde(default = "default_scheduler_interval")]
    pub interval_secs: u64,
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_scheduler_interval() -> u64 {
    300 // 5 minutes
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            interval_secs: default_scheduler_interval(),
        }
    }
}

/// Timeline (personalized feed) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineConfig {
    /// Page size used when the caller does not give one.
    #[serde(default = "default_timeline_limit")]
    pub default_limit: i64,
    /// Upper bound for the page size.
    #[serde(default = "default_timeline_max_limit")]
    pub max_limit: i64,
    /// Number of posts returned by the latest posts listing.
    #[serde(default = "default_latest_posts_limit")]
    pub latest_posts_limit: i64,
}

fn default_timeline_limit() -> i64 {
    10
}

fn default_timeline_max_limit() -> i64 {
    100
}

fn default_latest_posts_limit() -> i64 {
    20
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            default_limit: default_timeline_limit(),
            max_limit: default_timeline_max_limit(),
            latest_posts_limit: default_latest_posts_limit(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Feed fetching configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Timeline configuration.
    #[serde(default)]
    pub timeline: TimelineConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FeedhubError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FeedhubError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FEEDHUB_DATABASE_PATH`: Override the database path
    /// - `FEEDHUB_PORT`: Override the HTTP port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("FEEDHUB_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(port) = std::env::var("FEEDHUB_PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) if port.is_empty() => {}
                Err(_) => tracing::warn!("Ignoring invalid FEEDHUB_PORT value: {}", port),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.interval_secs == 0 {
            return Err(FeedhubError::Config(
                "scheduler.interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.fetch.connect_timeout_secs == 0
            || self.fetch.read_timeout_secs == 0
            || self.fetch.total_timeout_secs == 0
        {
            return Err(FeedhubError::Config(
                "fetch timeouts must be greater than 0".to_string(),
            ));
        }
        if self.fetch.max_feed_size_bytes == 0 {
            return Err(FeedhubError::Config(
                "fetch.max_feed_size_bytes must be greater than 0".to_string(),
            ));
        }
        if self.timeline.default_limit < 1 || self.timeline.max_limit < 1 {
            return Err(FeedhubError::Config(
                "timeline limits must be at least 1".to_string(),
            ));
        }
        if self.timeline.default_limit > self.timeline.max_limit {
            return Err(FeedhubError::Config(
                "timeline.default_limit must not exceed timeline.max_limit".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(FeedhubError::Config(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
