//! Distance/duration totals for multi-stop routes.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::google::{GeoClient, TravelMode};
use crate::models::{Route, RouteLeg, RouteTotals, RouteTotalsRow};
use crate::progress::progress_bar;

/// Sums consecutive-leg routing results per route.
///
/// Results are keyed by route id in two maps, one for distance and one for
/// duration. `None` marks a route with fewer than two stops.
pub struct RouteAggregator {
    client: Arc<dyn GeoClient>,
    mode: TravelMode,
    distances: HashMap<String, Option<u64>>,
    durations: HashMap<String, Option<u64>>,
    show_progress: bool,
}

impl RouteAggregator {
    pub fn new(client: Arc<dyn GeoClient>, mode: TravelMode) -> Self {
        Self {
            client,
            mode,
            distances: HashMap::new(),
            durations: HashMap::new(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Look up every leg of a route in order. Failed legs have no summary.
    pub async fn legs(&self, route_id: &str, stops: &[String]) -> Vec<RouteLeg> {
        let mut legs = Vec::with_capacity(stops.len().saturating_sub(1));

        for pair in stops.windows(2) {
            let (origin, destination) = (&pair[0], &pair[1]);
            let summary = match self.client.distance(origin, destination, self.mode).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(
                        "Route {}: leg '{}' -> '{}' failed, skipping: {}",
                        route_id, origin, destination, e
                    );
                    None
                }
            };
            legs.push(RouteLeg {
                origin: origin.clone(),
                destination: destination.clone(),
                summary,
            });
        }

        legs
    }

    /// Total distance and duration over the legs that succeeded.
    pub async fn aggregate_route(&self, route_id: &str, stops: &[String]) -> RouteTotals {
        if stops.len() < 2 {
            debug!("Route {} has {} stop(s), no legs", route_id, stops.len());
            return RouteTotals::default();
        }

        let legs = self.legs(route_id, stops).await;
        RouteTotals::from_legs(stops.len(), &legs)
    }

    /// Aggregate many routes with at most `concurrency` routes in flight.
    pub async fn aggregate_many(&mut self, routes: &[Route], concurrency: usize) {
        info!(
            "Aggregating {} routes ({} concurrent)",
            routes.len(),
            concurrency.max(1)
        );

        let pb = progress_bar(routes.len() as u64, self.show_progress, "routes");

        let mut results = Vec::with_capacity(routes.len());
        {
            let this = &*self;
            let mut lookups = futures::stream::iter(routes)
                .map(|route| async move {
                    let totals = this.aggregate_route(&route.id, &route.stops).await;
                    (route.id.clone(), totals)
                })
                .buffer_unordered(concurrency.max(1));

            while let Some(result) = lookups.next().await {
                results.push(result);
                pb.inc(1);
            }
        }
        pb.finish_with_message("routes complete");

        for (route_id, totals) in results {
            self.distances.insert(route_id.clone(), totals.distance);
            self.durations.insert(route_id, totals.duration);
        }
    }

    /// Totals of an aggregated route; `None` if the id was never aggregated
    pub fn totals(&self, route_id: &str) -> Option<RouteTotals> {
        Some(RouteTotals {
            distance: *self.distances.get(route_id)?,
            duration: *self.durations.get(route_id)?,
        })
    }

    pub fn distances(&self) -> &HashMap<String, Option<u64>> {
        &self.distances
    }

    pub fn durations(&self) -> &HashMap<String, Option<u64>> {
        &self.durations
    }

    /// Output rows in the order of `routes`
    pub fn rows(&self, routes: &[Route]) -> Vec<RouteTotalsRow> {
        routes
            .iter()
            .map(|route| {
                let totals = self.totals(&route.id).unwrap_or_default();
                RouteTotalsRow {
                    route_id: route.id.clone(),
                    google_distance: totals.distance,
                    google_duration: totals.duration,
                }
            })
            .collect()
    }
}
