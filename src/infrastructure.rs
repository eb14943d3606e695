//! Infrastructure layer for HTTP access, page parsing, configuration and logging
//!
//! This module provides the rate-limited HTTP client, the page fetching and
//! HTML extraction boundaries used by enrichment, and the clients for the
//! catalog's data and search endpoints.

pub mod config;
pub mod data_api;
pub mod errors;
pub mod http_client;
pub mod logging;
pub mod page_fetcher;
pub mod parsing;
pub mod retry_policy;
pub mod search;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use data_api::{DataApiClient, UserRef};
pub use errors::{ApiError, ConfigError, FetchError};
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use page_fetcher::{Document, FetchOutcome, HttpPageFetcher, PageFetcher};
pub use parsing::{ExtractorConfig, HtmlExtractor, SiteExtractor};
pub use retry_policy::RetryPolicy;
pub use search::SearchClient;
