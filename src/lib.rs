//! geopair - enrich address tables with geocoded coordinates and travel distances
//!
//! This library provides the lookup components shared by the `geopair` binary:
//! a memoizing coordinate cache, a multi-stop route aggregator and the pairwise
//! dataset enricher, all talking to the mapping service through [`GeoClient`].

pub mod cache;
pub mod enrich;
pub mod error;
pub mod google;
pub mod models;
pub mod progress;
pub mod routes;
pub mod table;

#[cfg(test)]
mod test_support;

pub use cache::CoordinateCache;
pub use enrich::DatasetEnricher;
pub use error::{LookupError, PairError, ParseError};
pub use google::{GeoClient, GoogleMapsClient, TravelMode};
pub use models::{Coordinate, EnrichedPairRecord, LocationRow, Route, RouteTotals};
pub use routes::RouteAggregator;
