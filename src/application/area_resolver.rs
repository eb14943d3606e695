//! Area hierarchy resolver
//!
//! Coordinates usually hang off large enclosing areas (crags, ranges) rather
//! than every sub-area, so GPS for a route is found by following "go up"
//! links until an area page exposes a location.
//!
//! Per hop: a transport failure retries the same hop under the retry policy;
//! a successful fetch without GPS climbs to the next hop. The walk ends with
//! an empty coordinate at the top of the hierarchy, on retry exhaustion, on a
//! cyclic parent chain, or at the depth limit when one is configured.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{AreaLink, Coordinate};
use crate::infrastructure::errors::FetchError;
use crate::infrastructure::page_fetcher::{Document, FetchOutcome, PageFetcher};
use crate::infrastructure::parsing::{AreaDetails, HtmlExtractor};
use crate::infrastructure::retry_policy::RetryPolicy;

/// How a hierarchy walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// An area page exposed coordinates
    Found,
    /// A page had no parent link
    TopOfHierarchy,
    /// A hop kept failing until the retry policy gave up
    RetriesExhausted { url: String },
    /// A parent link pointed back to a page already visited
    CycleDetected { url: String },
    /// The configured maximum number of hops was reached
    DepthLimit,
}

/// Outcome of a hierarchy walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub coordinate: Coordinate,
    /// Area pages fetched successfully
    pub hops: usize,
    /// Fetch calls issued, retries included
    pub fetch_attempts: usize,
    pub termination: Termination,
}

pub struct AreaHierarchyResolver<P, X> {
    fetcher: Arc<P>,
    extractor: Arc<X>,
    retry: RetryPolicy,
    /// Hop cap; `None` walks until the top of the hierarchy or a cycle
    max_depth: Option<usize>,
}

impl<P, X> AreaHierarchyResolver<P, X>
where
    P: PageFetcher,
    X: HtmlExtractor,
{
    pub fn new(fetcher: Arc<P>, extractor: Arc<X>) -> Self {
        Self {
            fetcher,
            extractor,
            retry: RetryPolicy::default(),
            max_depth: None,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Nearest coordinate above the route; empty when none is found
    pub async fn resolve_gps(&self, initial: &Document) -> Coordinate {
        self.resolve_gps_detailed(initial).await.coordinate
    }

    pub async fn resolve_gps_detailed(&self, initial: &Document) -> Resolution {
        let mut visited = HashSet::from([initial.url().to_string()]);
        let mut link = self.extractor.extract_parent_area_link(initial);
        let mut hops = 0;
        let mut fetch_attempts = 0;

        let finish = |termination, hops, fetch_attempts| Resolution {
            coordinate: Coordinate::empty(),
            hops,
            fetch_attempts,
            termination,
        };

        loop {
            let Some(area) = link.take() else {
                debug!("Reached top of hierarchy from {} after {} hops", initial.url(), hops);
                return finish(Termination::TopOfHierarchy, hops, fetch_attempts);
            };

            if let Some(max_depth) = self.max_depth.filter(|&max| hops >= max) {
                warn!("Depth limit {} reached while resolving {}", max_depth, initial.url());
                return finish(Termination::DepthLimit, hops, fetch_attempts);
            }

            if !visited.insert(area.as_str().to_string()) {
                warn!("Cyclic area hierarchy at {} (from {})", area, initial.url());
                return finish(
                    Termination::CycleDetected { url: area.to_string() },
                    hops,
                    fetch_attempts,
                );
            }

            let (fetched, attempts) = self.fetch_hop(&area).await;
            fetch_attempts += attempts;
            let Some(document) = fetched else {
                return finish(
                    Termination::RetriesExhausted { url: area.to_string() },
                    hops,
                    fetch_attempts,
                );
            };
            hops += 1;

            let AreaDetails { gps: coordinate, parent } = self.extractor.extract_area(&document);
            if !coordinate.is_empty() {
                debug!("GPS {} found at {} ({} hops)", coordinate, area, hops);
                return Resolution {
                    coordinate,
                    hops,
                    fetch_attempts,
                    termination: Termination::Found,
                };
            }

            link = parent;
        }
    }

    /// Fetch one hop, retrying transport failures under the retry policy.
    /// Returns the page (if any) and the number of fetch calls made.
    async fn fetch_hop(&self, area: &AreaLink) -> (Option<Document>, usize) {
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            let outcome =
                match tokio::time::timeout(self.retry.hop_timeout, self.fetcher.fetch(area.as_str()))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => FetchOutcome::Failed(FetchError::Timeout {
                        url: area.to_string(),
                        timeout: self.retry.hop_timeout,
                    }),
                };

            let error = match outcome {
                FetchOutcome::Ok(document) => return (Some(document), attempt as usize),
                FetchOutcome::Failed(error) => error,
            };

            if !self.retry.should_retry(attempt) {
                warn!("❌ Giving up on {} after {} attempts: {}", area, attempt, error);
                return (None, attempt as usize);
            }

            let delay = self.retry.backoff(attempt);
            warn!(
                "Transport failure on {} (attempt {}), retrying in {:?}: {}",
                area, attempt, delay, error
            );
            tokio::time::sleep(delay).await;
        }
    }
}
