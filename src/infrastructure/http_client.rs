//! HTTP client for page scraping and API calls with rate limiting
//!
//! Provides a client that respects the catalog server's resources: every
//! clone shares one token-bucket rate limiter, so a wide worker pool still
//! issues requests at the configured pace.

use anyhow::{Context, Result};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::config::defaults;
use crate::infrastructure::errors::{ApiError, FetchError};

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            follow_redirects: true,
        }
    }
}

/// Rate-limited HTTP client shared by the page fetcher and the API clients
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            config,
        })
    }

    /// Issue a rate-limited GET; non-2xx statuses become `FetchError::Status`
    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        self.rate_limiter.until_ready().await;

        tracing::debug!("🌐 HTTP GET: {}", url);
        let response = self
            .client
            .get(parsed)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("HTTP error {}: {}", status, url);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// Fetch URL and return text content
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url, &[]).await?;
        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch URL with query parameters and return the raw body bytes
    pub async fn get_bytes(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url, query).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| FetchError::Body {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    /// GET with query parameters and decode the JSON body.
    ///
    /// `what` names the call in decode errors.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &'static str,
    ) -> Result<T, ApiError> {
        let body = self.get_bytes(url, query).await?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode { what, source })
    }

    /// Get the configuration
    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
