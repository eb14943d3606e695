//! HTML extraction for route and area pages
//!
//! All page-shape assumptions (label text, icon URL, map-link marker) live
//! behind `HtmlExtractor`, so a markup change on the site only touches this
//! module and its configuration.

pub mod config;
pub mod error;
pub mod site_extractor;

pub use config::ExtractorConfig;
pub use error::{ParsingError, ParsingResult};
pub use site_extractor::SiteExtractor;

use crate::domain::{AreaLink, Coordinate};
use crate::infrastructure::page_fetcher::Document;

/// What an area page contributes to the hierarchy walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaDetails {
    pub gps: Coordinate,
    pub parent: Option<AreaLink>,
}

/// Pulls enrichment data out of fetched pages.
///
/// Every operation is partial: a missing label or icon is expected and
/// yields an empty value, never an error. Implementations must be pure
/// functions of the document.
pub trait HtmlExtractor: Send + Sync {
    /// First-ascent credit from a route detail page; empty when absent
    fn extract_first_ascent(&self, document: &Document) -> String;

    /// Coordinate pair from an area page; empty when the page has none
    fn extract_area_gps(&self, document: &Document) -> Coordinate;

    /// Link to the enclosing area; `None` at the top of the hierarchy
    fn extract_parent_area_link(&self, document: &Document) -> Option<AreaLink>;

    /// GPS and parent link of an area page in one pass
    fn extract_area(&self, document: &Document) -> AreaDetails {
        AreaDetails {
            gps: self.extract_area_gps(document),
            parent: self.extract_parent_area_link(document),
        }
    }
}

impl<T: HtmlExtractor + ?Sized> HtmlExtractor for std::sync::Arc<T> {
    fn extract_first_ascent(&self, document: &Document) -> String {
        (**self).extract_first_ascent(document)
    }

    fn extract_area_gps(&self, document: &Document) -> Coordinate {
        (**self).extract_area_gps(document)
    }

    fn extract_parent_area_link(&self, document: &Document) -> Option<AreaLink> {
        (**self).extract_parent_area_link(document)
    }

    fn extract_area(&self, document: &Document) -> AreaDetails {
        (**self).extract_area(document)
    }
}
