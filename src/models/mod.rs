//! Core data models for the enrichment pipeline.

pub mod coordinate;
pub mod record;
pub mod route;

pub use coordinate::Coordinate;
pub use record::{EnrichedPairRecord, LocationRow};
pub use route::{
    split_stops, Route, RouteLeg, RouteRow, RouteTotals, RouteTotalsRow, TravelSummary,
    STOP_SEPARATOR,
};
