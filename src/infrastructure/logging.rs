//! Logging system configuration and initialization
//!
//! This module provides:
//! - Console output on stderr (stdout carries command results)
//! - Optional file output through a non-blocking appender
//! - Optional structured JSON for the file layer
//! - Local-time timestamps
//! - Dependency noise suppressed unless the level is TRACE

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

use crate::infrastructure::config::ConfigManager;

const LOG_FILE_NAME: &str = "route-enricher.log";

// Keeps the non-blocking file writer alive for the whole process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Directory log files are written to
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    config.log_dir.clone().unwrap_or_else(|| {
        ConfigManager::get_app_data_dir()
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default())
            .join("logs")
    })
}

/// Build the env filter; `RUST_LOG` wins over the configured level
pub fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", level, e))?;

    if !level.to_lowercase().contains("trace") {
        for directive in [
            "reqwest=info",
            "hyper=warn",
            "hyper_util=warn",
            "h2=warn",
            "html5ever=warn",
            "selectors=warn",
        ] {
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e| anyhow!("Invalid log directive '{}': {}", directive, e))?,
            );
        }
    }

    Ok(filter)
}

/// Initialize logging with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with custom configuration
///
/// Override the filtering with `RUST_LOG`, e.g.
/// `RUST_LOG="debug,reqwest=debug" route-enricher enrich 105748391`.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(&config.level)?;
    let registry = Registry::default().with(env_filter);

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
    });

    let (plain_file_layer, json_file_layer, log_dir) = if config.file_output {
        let log_dir = get_log_directory(config);
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let (file_writer, file_guard) = non_blocking(rolling::daily(&log_dir, LOG_FILE_NAME));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        if config.json_format {
            let layer = fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false);
            (None, Some(layer), Some(log_dir))
        } else {
            let layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false);
            (Some(layer), None, Some(log_dir))
        }
    } else {
        (None, None, None)
    };

    if console_layer.is_none() && plain_file_layer.is_none() && json_file_layer.is_none() {
        return Err(anyhow!("No logging output configured"));
    }

    registry
        .with(console_layer)
        .with(plain_file_layer)
        .with(json_file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    info!("Logging system initialized (level: {})", config.level);
    if let Some(log_dir) = log_dir {
        info!("Log directory: {:?}", log_dir);
    }

    Ok(())
}
