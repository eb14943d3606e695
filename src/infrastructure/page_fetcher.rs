//! Page fetching boundary
//!
//! `PageFetcher` issues exactly one GET per call and reports the result as a
//! `FetchOutcome`. No retries and no caching happen here; the area-hierarchy
//! resolver owns the retry policy.

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;

use crate::infrastructure::errors::FetchError;
use crate::infrastructure::http_client::HttpClient;

/// A fetched page.
///
/// Holds the raw body and hands out a tolerant html5ever parse on demand.
/// `scraper::Html` is not `Send`, so the parsed tree only ever lives inside a
/// synchronous extraction scope and never across an `.await`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    url: String,
    body: Arc<str>,
}

impl Document {
    pub fn new(url: impl Into<String>, body: impl Into<Arc<str>>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// URL the document was fetched from
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Best-effort tree construction; malformed markup never fails
    pub fn parse(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Result of a single fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok(Document),
    Failed(FetchError),
}

impl FetchOutcome {
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn into_result(self) -> Result<Document, FetchError> {
        match self {
            Self::Ok(document) => Ok(document),
            Self::Failed(error) => Err(error),
        }
    }
}

impl From<Result<Document, FetchError>> for FetchOutcome {
    fn from(result: Result<Document, FetchError>) -> Self {
        match result {
            Ok(document) => Self::Ok(document),
            Err(error) => Self::Failed(error),
        }
    }
}

/// Retrieves a URL and returns the page or the reason it failed
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        (**self).fetch(url).await
    }
}

/// `PageFetcher` over the shared rate-limited HTTP client
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: HttpClient,
}

impl HttpPageFetcher {
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        match self.client.get_text(url).await {
            Ok(body) => {
                tracing::debug!("Fetched {} ({} chars)", url, body.len());
                FetchOutcome::Ok(Document::new(url, body))
            }
            Err(error) => {
                tracing::debug!("Fetch failed: {}", error);
                FetchOutcome::Failed(error)
            }
        }
    }
}
