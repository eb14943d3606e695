//! Application layer module
//!
//! Orchestrates the infrastructure boundaries into the enrichment use case:
//! the concurrent executor, the area hierarchy walk and the pipeline itself.

pub mod area_resolver;
pub mod enrichment;
pub mod executor;

pub use area_resolver::{AreaHierarchyResolver, Resolution, Termination};
pub use enrichment::{EnrichmentStats, RouteEnrichmentPipeline, SitePipeline};
pub use executor::{BoundedExecutor, ConcurrentMapExecutor, InlineExecutor, TaskFailure};
