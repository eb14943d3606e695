//! Route enrichment pipeline
//!
//! For one route: fetch the detail page, read the first ascent, then resolve
//! GPS through the area hierarchy. For a batch: fan the routes out through a
//! `ConcurrentMapExecutor` and put every result back in its input position.
//! A route whose worker fails for any reason comes back exactly as it went in.

use anyhow::{Context, Result};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::area_resolver::{AreaHierarchyResolver, Termination};
use crate::application::executor::{BoundedExecutor, ConcurrentMapExecutor, TaskFailure};
use crate::domain::{RouteRecord, RoutesResponse};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::page_fetcher::{FetchOutcome, HttpPageFetcher, PageFetcher};
use crate::infrastructure::parsing::{ExtractorConfig, HtmlExtractor, SiteExtractor};
use crate::infrastructure::retry_policy::RetryPolicy;

/// Summary of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentStats {
    pub total: usize,
    /// Routes that received `fa` and `gps`
    pub enriched: usize,
    pub with_first_ascent: usize,
    pub with_gps: usize,
    /// Detail page could not be fetched
    pub fetch_failed: usize,
    /// Worker panicked or was cancelled
    pub worker_failed: usize,
    /// Worker was still running at the batch deadline
    pub timed_out: usize,
}

impl EnrichmentStats {
    /// Routes returned exactly as they went in
    pub const fn unchanged(&self) -> usize {
        self.fetch_failed + self.worker_failed + self.timed_out
    }

    fn record(&mut self, outcome: &WorkerOutcome) {
        match outcome {
            WorkerOutcome::Enriched(route) => {
                self.enriched += 1;
                if route.fa.as_deref().is_some_and(|fa| !fa.is_empty()) {
                    self.with_first_ascent += 1;
                }
                if route.gps.as_ref().is_some_and(|gps| !gps.is_empty()) {
                    self.with_gps += 1;
                }
            }
            WorkerOutcome::FetchFailed => self.fetch_failed += 1,
            WorkerOutcome::TimedOut => self.timed_out += 1,
        }
    }
}

enum WorkerOutcome {
    Enriched(RouteRecord),
    FetchFailed,
    TimedOut,
}

/// Everything one worker needs; shared by all workers of a batch
struct RouteEnricher<P, X> {
    fetcher: Arc<P>,
    extractor: Arc<X>,
    resolver: AreaHierarchyResolver<P, X>,
}

impl<P, X> RouteEnricher<P, X>
where
    P: PageFetcher,
    X: HtmlExtractor,
{
    /// `None` when the detail page could not be fetched
    async fn enrich(&self, mut route: RouteRecord) -> Option<RouteRecord> {
        let document = match self.fetcher.fetch(&route.url).await {
            FetchOutcome::Ok(document) => document,
            FetchOutcome::Failed(error) => {
                warn!("Skipping route {}: {}", route.id, error);
                return None;
            }
        };

        let fa = self.extractor.extract_first_ascent(&document);
        let resolution = self.resolver.resolve_gps_detailed(&document).await;

        match &resolution.termination {
            Termination::Found => {}
            Termination::RetriesExhausted { url } => {
                warn!("Route {}: no GPS, area {} unreachable", route.id, url);
            }
            other => debug!("Route {}: no GPS ({:?} after {} hops)", route.id, other, resolution.hops),
        }

        route.fa = Some(fa);
        route.gps = Some(resolution.coordinate);
        Some(route)
    }
}

pub struct RouteEnrichmentPipeline<P, X, E> {
    fetcher: Arc<P>,
    extractor: Arc<X>,
    executor: E,
    retry: RetryPolicy,
    max_depth: Option<usize>,
    batch_deadline: Option<Duration>,
}

impl<P, X, E> RouteEnrichmentPipeline<P, X, E>
where
    P: PageFetcher + 'static,
    X: HtmlExtractor + 'static,
    E: ConcurrentMapExecutor,
{
    pub fn new(fetcher: Arc<P>, extractor: Arc<X>, executor: E) -> Self {
        Self {
            fetcher,
            extractor,
            executor,
            retry: RetryPolicy::default(),
            max_depth: None,
            batch_deadline: None,
        }
    }

    /// Apply the retry, depth and deadline settings of `config`
    #[must_use]
    pub fn configured(self, config: &AppConfig) -> Self {
        self.with_retry_policy(config.retry.to_policy())
            .with_max_depth(config.enrichment.max_area_depth)
            .with_batch_deadline(config.enrichment.batch_deadline())
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

    #[must_use]
    pub const fn with_batch_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.batch_deadline = deadline;
        self
    }

    fn enricher(&self) -> RouteEnricher<P, X> {
        RouteEnricher {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            resolver: AreaHierarchyResolver::new(Arc::clone(&self.fetcher), Arc::clone(&self.extractor))
                .with_retry_policy(self.retry.clone())
                .with_max_depth(self.max_depth),
        }
    }

    /// Enrich a single route; on a failed detail fetch the route is
    /// returned unchanged
    pub async fn enrich_one(&self, route: RouteRecord) -> RouteRecord {
        let fallback = route.clone();
        self.enricher().enrich(route).await.unwrap_or(fallback)
    }

    /// Enrich every route; output length and order match the input
    pub async fn enrich_batch(&self, routes: Vec<RouteRecord>) -> Vec<RouteRecord> {
        self.enrich_batch_with_stats(routes).await.0
    }

    pub async fn enrich_batch_with_stats(
        &self,
        routes: Vec<RouteRecord>,
    ) -> (Vec<RouteRecord>, EnrichmentStats) {
        let mut stats = EnrichmentStats {
            total: routes.len(),
            ..EnrichmentStats::default()
        };
        if routes.is_empty() {
            return (routes, stats);
        }

        info!("🚀 Enriching {} routes", routes.len());
        let started = Instant::now();
        let deadline = self.batch_deadline.map(|budget| started + budget);
        let enricher = Arc::new(self.enricher());
        let originals = routes.clone();

        let slots = self
            .executor
            .map(routes, move |route| {
                let enricher = Arc::clone(&enricher);
                async move {
                    let work = enricher.enrich(route);
                    let enriched = match deadline {
                        Some(deadline) => match tokio::time::timeout_at(deadline, work).await {
                            Ok(enriched) => enriched,
                            Err(_) => return WorkerOutcome::TimedOut,
                        },
                        None => work.await,
                    };
                    enriched.map_or(WorkerOutcome::FetchFailed, WorkerOutcome::Enriched)
                }
            })
            .await;

        let merged = originals
            .into_iter()
            .zip(slots)
            .map(|(original, slot)| match slot {
                Ok(outcome) => {
                    stats.record(&outcome);
                    match outcome {
                        WorkerOutcome::Enriched(route) => route,
                        WorkerOutcome::FetchFailed => original,
                        WorkerOutcome::TimedOut => {
                            warn!("⏰ Route {} hit the batch deadline", original.id);
                            original
                        }
                    }
                }
                Err(failure) => {
                    stats.worker_failed += 1;
                    if failure != TaskFailure::Cancelled {
                        warn!("Worker for route {} failed: {}", original.id, failure);
                    }
                    original
                }
            })
            .collect();

        info!(
            "✅ Enriched {}/{} routes in {:.2?} ({} with GPS, {} unchanged)",
            stats.enriched,
            stats.total,
            started.elapsed(),
            stats.with_gps,
            stats.unchanged()
        );

        (merged, stats)
    }

    /// Enrich the `routes` array of a data endpoint response in place
    pub async fn enrich_routes_response(&self, response: &mut RoutesResponse) -> EnrichmentStats {
        let routes = std::mem::take(&mut response.routes);
        let (routes, stats) = self.enrich_batch_with_stats(routes).await;
        response.routes = routes;
        stats
    }
}

/// Pipeline against the live site: HTTP fetcher, site extractor and a
/// bounded worker pool
pub type SitePipeline = RouteEnrichmentPipeline<HttpPageFetcher, SiteExtractor, BoundedExecutor>;

impl SitePipeline {
    pub fn from_config(config: &AppConfig, client: HttpClient, cancellation: CancellationToken) -> Result<Self> {
        let extractor = SiteExtractor::with_config(ExtractorConfig::with_root_url(&config.site.root_url))
            .context("Failed to build page extractor")?;
        let limit = NonZeroUsize::new(config.enrichment.max_concurrent_routes)
            .context("enrichment.max_concurrent_routes must be greater than 0")?;
        let executor = BoundedExecutor::new(limit).with_cancellation(cancellation);

        Ok(Self::new(Arc::new(HttpPageFetcher::new(client)), Arc::new(extractor), executor).configured(config))
    }
}
