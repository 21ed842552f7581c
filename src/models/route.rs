//! Multi-stop routes and their per-leg travel results.

use serde::{Deserialize, Serialize};

/// Separator between stops in the concatenated `stops` column.
pub const STOP_SEPARATOR: &str = "@^";

/// Routed distance and duration for one origin/destination query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelSummary {
    /// Meters
    pub distance: u64,
    /// Seconds
    pub duration: u64,
}

/// Consecutive pair of stops within a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLeg {
    pub origin: String,
    pub destination: String,
    /// `None` when the lookup failed
    pub summary: Option<TravelSummary>,
}

/// Ordered stops identified by a route id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: String,
    pub stops: Vec<String>,
}

impl Route {
    pub fn new(id: impl Into<String>, stops: Vec<String>) -> Self {
        Self {
            id: id.into(),
            stops,
        }
    }

    /// Build a route from its `@^`-joined stop string.
    pub fn from_concatenated(id: impl Into<String>, stops: &str) -> Self {
        Self::new(id, split_stops(stops))
    }
}

/// Split a concatenated stop string. An empty string is a single empty stop.
pub fn split_stops(stops: &str) -> Vec<String> {
    stops.split(STOP_SEPARATOR).map(str::to_string).collect()
}

/// Aggregate distance/duration of a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteTotals {
    pub distance: Option<u64>,
    pub duration: Option<u64>,
}

impl RouteTotals {
    /// Sum the successful legs.
    ///
    /// Fewer than two stops has no legs and yields `None` for both values;
    /// otherwise failed legs are skipped and an all-failed route sums to zero.
    /// Sums saturate at `u64::MAX`.
    pub fn from_legs(stop_count: usize, legs: &[RouteLeg]) -> Self {
        if stop_count < 2 {
            return Self::default();
        }

        let (distance, duration) = legs
            .iter()
            .filter_map(|leg| leg.summary)
            .fold((0u64, 0u64), |(dist, dur), s| {
                (dist.saturating_add(s.distance), dur.saturating_add(s.duration))
            });

        Self {
            distance: Some(distance),
            duration: Some(duration),
        }
    }
}

/// Input row of the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRow {
    pub route_id: String,
    pub stops: String,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route::from_concatenated(row.route_id, &row.stops)
    }
}

/// Output row of the route table; null totals are written as empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTotalsRow {
    pub route_id: String,
    pub google_distance: Option<u64>,
    pub google_duration: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(origin: &str, destination: &str, summary: Option<(u64, u64)>) -> RouteLeg {
        RouteLeg {
            origin: origin.to_string(),
            destination: destination.to_string(),
            summary: summary.map(|(distance, duration)| TravelSummary { distance, duration }),
        }
    }

    #[test]
    fn test_split_stops() {
        assert_eq!(split_stops("A@^B@^C"), vec!["A", "B", "C"]);
        assert_eq!(split_stops("A"), vec!["A"]);
        assert_eq!(split_stops(""), vec![""]);
    }

    #[test]
    fn test_totals_single_stop_is_null() {
        assert_eq!(RouteTotals::from_legs(1, &[]), RouteTotals::default());
        assert_eq!(RouteTotals::from_legs(0, &[]), RouteTotals::default());
    }

    #[test]
    fn test_totals_skip_failed_legs() {
        let legs = vec![leg("A", "B", None), leg("B", "C", Some((500, 60)))];
        let totals = RouteTotals::from_legs(3, &legs);
        assert_eq!(totals.distance, Some(500));
        assert_eq!(totals.duration, Some(60));
    }

    #[test]
    fn test_totals_all_failed_is_zero() {
        let legs = vec![leg("A", "B", None)];
        let totals = RouteTotals::from_legs(2, &legs);
        assert_eq!(totals.distance, Some(0));
        assert_eq!(totals.duration, Some(0));
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let legs = vec![
            leg("A", "B", Some((u64::MAX, 1))),
            leg("B", "C", Some((1, 1))),
        ];
        let totals = RouteTotals::from_legs(3, &legs);
        assert_eq!(totals.distance, Some(u64::MAX));
        assert_eq!(totals.duration, Some(2));
    }
}
