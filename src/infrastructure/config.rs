//! Configuration infrastructure
//!
//! Contains configuration loading and management for the enrichment client.
//!
//! Configuration is organized into sections, each with its own defaults:
//! 1. `site` - catalog endpoints and the data API key
//! 2. `http` - client identity, timeouts and request rate
//! 3. `enrichment` / `retry` - worker pool, deadline and hierarchy-walk retries
//! 4. `logging` - log level and outputs

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::domain::constants::site;
use crate::infrastructure::errors::ConfigError;
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::retry_policy::RetryPolicy;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub http: HttpClientConfig,
    pub enrichment: EnrichmentConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// Catalog endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root used to resolve relative links in scraped pages
    pub root_url: String,

    /// Structured data endpoint
    pub data_url: String,

    /// Search endpoint
    pub search_url: String,

    /// Data API key; may also be supplied on the command line
    pub api_key: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root_url: site::ROOT_URL.to_string(),
            data_url: site::DATA_URL.to_string(),
            search_url: site::SEARCH_URL.to_string(),
            api_key: None,
        }
    }
}

/// Enrichment pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Routes enriched at the same time
    pub max_concurrent_routes: usize,

    /// Wall-clock budget for a whole batch; workers still running when it
    /// expires are cancelled and their routes returned unchanged
    pub batch_deadline_seconds: Option<u64>,

    /// Maximum parent-area hops before giving up on GPS; unbounded when
    /// unset, cycles still end the walk
    pub max_area_depth: Option<usize>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_routes: defaults::MAX_CONCURRENT_ROUTES,
            batch_deadline_seconds: None,
            max_area_depth: None,
        }
    }
}

impl EnrichmentConfig {
    pub fn batch_deadline(&self) -> Option<Duration> {
        self.batch_deadline_seconds.map(Duration::from_secs)
    }
}

/// Retry settings for each hop of the area-hierarchy walk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per hop; `null` retries forever
    pub max_attempts: Option<u32>,

    /// First backoff delay in milliseconds, doubled per attempt
    pub base_backoff_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds
    pub max_backoff_ms: u64,

    /// Timeout for one hop attempt in seconds
    pub hop_timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: Some(defaults::RETRY_ATTEMPTS),
            base_backoff_ms: defaults::BASE_BACKOFF_MS,
            max_backoff_ms: defaults::MAX_BACKOFF_MS,
            hop_timeout_seconds: defaults::HOP_TIMEOUT_SECONDS,
        }
    }
}

impl RetryConfig {
    /// Build the runtime retry policy; `max_attempts: 0` is treated as 1
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self
                .max_attempts
                .map(|attempts| NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN)),
            base_backoff: Duration::from_millis(self.base_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            hop_timeout: Duration::from_secs(self.hop_timeout_seconds),
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs in the log file
    pub json_format: bool,

    /// Enable console output (stderr, so stdout stays clean for results)
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `<data dir>/route-enricher/logs`
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reject values that would stall or misdirect a pipeline
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enrichment.max_concurrent_routes == 0 {
            return Err(ConfigError::invalid(
                "enrichment.max_concurrent_routes",
                "must be greater than 0",
            ));
        }
        if self.http.max_requests_per_second == 0 {
            return Err(ConfigError::invalid(
                "http.max_requests_per_second",
                "must be greater than 0",
            ));
        }
        if self.retry.max_backoff_ms == 0 && self.retry.base_backoff_ms > 0 {
            return Err(ConfigError::invalid(
                "retry.max_backoff_ms",
                "must be greater than 0 when a base backoff is set",
            ));
        }
        for (field, value) in [
            ("site.root_url", &self.site.root_url),
            ("site.data_url", &self.site.data_url),
            ("site.search_url", &self.site.search_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::invalid(field, "must be an absolute URL"));
            }
        }
        Ok(())
    }
}

/// Loads and persists `AppConfig` as JSON
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("route-enricher");

        Ok(config_dir)
    }

    /// Get application data directory
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join("route-enricher");

        Ok(data_dir)
    }

    /// Configuration manager for the default per-user location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("config.json");
        Ok(Self { config_path })
    }

    /// Configuration manager for an explicit file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration, writing defaults on first run
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig> {
        if fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return self.load_config().await;
        }

        info!("🎉 First run detected - writing default configuration");
        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;
        Ok(default_config)
    }

    /// Load configuration from disk; missing fields fall back to defaults
    pub async fn load_config(&self) -> Result<AppConfig> {
        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", self.config_path))?;
        config.validate()?;

        info!("✅ Configuration loaded from {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;

        info!("💾 Configuration saved to {:?}", self.config_path);
        Ok(())
    }
}

/// Default values for every configurable setting
pub mod defaults {
    /// Default requests per second across all workers
    pub const MAX_REQUESTS_PER_SECOND: u32 = 10;

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default number of routes enriched concurrently
    pub const MAX_CONCURRENT_ROUTES: usize = 16;

    /// Default retry attempts per hierarchy hop
    pub const RETRY_ATTEMPTS: u32 = 5;

    /// Default first backoff delay in milliseconds
    pub const BASE_BACKOFF_MS: u64 = 500;

    /// Default backoff ceiling in milliseconds
    pub const MAX_BACKOFF_MS: u64 = 30_000;

    /// Default timeout for one hierarchy hop in seconds
    pub const HOP_TIMEOUT_SECONDS: u64 = 30;

    /// Default user agent
    pub const USER_AGENT: &str = "route-enricher/0.1 (climbing route catalog client)";
}
