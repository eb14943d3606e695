//! Site characteristics and domain constants
//!
//! Every assumption about the catalog site's URLs and page markup is pinned
//! here so that a markup change touches a single file.

/// Catalog site endpoints
pub mod site {
    /// Root used to resolve relative links found in pages
    pub const ROOT_URL: &str = "https://www.mountainproject.com";

    /// Structured data endpoint (action-based query API)
    pub const DATA_URL: &str = "https://www.mountainproject.com/data";

    /// Category search endpoint returning HTML result fragments inside JSON
    pub const SEARCH_URL: &str =
        "https://www.mountainproject.com/ajax/public/search/results/category";
}

/// Markup contract of rendered route and area pages
pub mod markup {
    /// Label cell preceding the first-ascent text (note the non-breaking space)
    pub const FIRST_ASCENT_LABEL: &str = "FA:\u{a0}";

    /// Label cell preceding the "<lat>, <long> View Map ..." text
    pub const LOCATION_LABEL: &str = "Location:\u{a0}";

    /// Literal text that follows the coordinate pair in the location cell
    pub const MAP_LINK_MARKER: &str = "View Map";

    /// "Go up" icon; its enclosing anchor links to the parent area
    pub const PARENT_AREA_ICON_SRC: &str = "https://cdn.apstatic.com/mp-img/up.gif";
}

/// Structured data and search API limits
pub mod api {
    /// Maximum route ids accepted by one `getRoutes` call
    pub const ROUTE_BATCH_SIZE: usize = 100;

    /// Page size used when walking search results
    pub const SEARCH_PAGE_SIZE: usize = 100;

    /// Search category holding route results
    pub const ROUTE_SEARCH_CATEGORY: &str = "Routes";
}
