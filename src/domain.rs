//! Domain module - route records and the value objects enrichment produces
//!
//! Each module is its own file in the domain/ directory; the public
//! exports below are the types the rest of the crate works with.

pub mod constants;
pub mod coordinate;
pub mod route;

pub use coordinate::{AreaLink, Coordinate};
pub use route::{RouteId, RouteRecord, RoutesResponse};
