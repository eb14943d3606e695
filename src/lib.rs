//! Route Enricher - climbing route catalog client
//!
//! Fetches route records from the catalog's structured data endpoint and
//! enriches them with data only published on the rendered pages: first-ascent
//! credit from the route page and GPS coordinates from the nearest enclosing
//! area that publishes them.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;
