//! Error types for the fetch, API and configuration boundaries
//!
//! Transport failures never escape as panics: the page fetcher folds them
//! into `FetchOutcome::Failed`, and the data/search clients return them as
//! `ApiError` so the caller decides whether a batch can continue.

use std::time::Duration;
use thiserror::Error;

/// A single page fetch failed: bad status, connection error or timeout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("HTTP error {status}: {url}")]
    Status { status: u16, url: String },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::Request { url, .. }
            | Self::Status { url, .. }
            | Self::Body { url, .. }
            | Self::Timeout { url, .. } => url,
        }
    }

    /// HTTP status code, when the server answered at all
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures of the structured data endpoint and the search endpoint
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] FetchError),

    #[error("Failed to decode {what} response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Search failed for query '{query}' at offset {offset}: {source}")]
    Search {
        query: String,
        offset: usize,
        #[source]
        source: Box<ApiError>,
    },

    #[error("Malformed search result: {0}")]
    MalformedSearchResult(String),
}

/// Configuration values that cannot drive a pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration error in '{field}': {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub fn invalid(field: &str, message: &str) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_reports_url_and_status() {
        let error = FetchError::Status {
            status: 503,
            url: "https://example.com/area/1".to_string(),
        };
        assert_eq!(error.url(), "https://example.com/area/1");
        assert_eq!(error.status(), Some(503));
        assert_eq!(error.to_string(), "HTTP error 503: https://example.com/area/1");
    }

    #[test]
    fn search_error_wraps_cause() {
        let cause = ApiError::from(FetchError::Status {
            status: 500,
            url: "https://example.com/search".to_string(),
        });
        let error = ApiError::Search {
            query: "yellow wall".to_string(),
            offset: 100,
            source: Box::new(cause),
        };
        assert!(error.to_string().contains("offset 100"));
    }
}
