//! Pairwise enrichment of a location table.
//!
//! Every unordered pair of rows becomes one [`EnrichedPairRecord`] holding both
//! locations, their geodesic distance and the routed distance/duration from the
//! mapping service. Pairs are processed one at a time, in index order.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::CoordinateCache;
use crate::error::PairError;
use crate::google::{GeoClient, TravelMode};
use crate::models::{Coordinate, EnrichedPairRecord, LocationRow};
use crate::progress::progress_bar;

/// All 2-combinations of `0..n` in lexicographic order
pub fn pair_indices(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

/// Number of unordered pairs of `n` rows
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

pub struct DatasetEnricher<'a> {
    client: Arc<dyn GeoClient>,
    mode: TravelMode,
    fallback: Option<&'a CoordinateCache>,
    show_progress: bool,
}

impl<'a> DatasetEnricher<'a> {
    pub fn new(client: Arc<dyn GeoClient>, mode: TravelMode) -> Self {
        Self {
            client,
            mode,
            fallback: None,
            show_progress: false,
        }
    }

    /// Geocode rows whose coordinate is missing or malformed through `cache`
    pub fn with_geocoding_fallback(mut self, cache: &'a CoordinateCache) -> Self {
        self.fallback = Some(cache);
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Coordinate of every row, `None` for rows that cannot be placed.
    async fn row_coordinates(&self, rows: &[LocationRow]) -> Vec<Option<Coordinate>> {
        let mut coordinates = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let coordinate = match row.parse_coordinate() {
                Ok(c) => Some(c),
                Err(e) => match self.fallback {
                    Some(cache) => {
                        debug!("Row {} ('{}'): {}, geocoding", idx, row.address, e);
                        cache.resolve(&row.address).await
                    }
                    None => {
                        warn!("Row {} ('{}'): {}", idx, row.address, e);
                        None
                    }
                },
            };
            coordinates.push(coordinate);
        }

        coordinates
    }

    async fn build_pair(
        &self,
        (origin_idx, origin): (usize, &LocationRow),
        origin_coordinate: Option<Coordinate>,
        (destination_idx, destination): (usize, &LocationRow),
        destination_coordinate: Option<Coordinate>,
    ) -> Result<EnrichedPairRecord, PairError> {
        let missing = |row: usize, r: &LocationRow| PairError::MissingCoordinate {
            row,
            address: r.address.clone(),
        };
        let origin_coordinate = origin_coordinate.ok_or_else(|| missing(origin_idx, origin))?;
        let destination_coordinate =
            destination_coordinate.ok_or_else(|| missing(destination_idx, destination))?;

        let geodesic_distance = origin_coordinate.geodesic_km(destination_coordinate);

        let summary = self
            .client
            .distance(&origin.address, &destination.address, self.mode)
            .await?;

        Ok(EnrichedPairRecord {
            origin_address: origin.address.clone(),
            origin_borough: origin.borough.clone(),
            origin_coordinate,
            destination_address: destination.address.clone(),
            destination_borough: destination.borough.clone(),
            is_same_borough: origin.borough == destination.borough,
            destination_coordinate,
            geodesic_distance,
            google_distance: summary.distance,
            google_duration: summary.duration,
        })
    }

    /// One record per successfully processed pair, in pair-enumeration order.
    ///
    /// A pair whose coordinates or distance lookup fail is skipped; it never
    /// affects the pairs after it.
    pub async fn build_all_pairs(&self, rows: &[LocationRow]) -> Vec<EnrichedPairRecord> {
        let coordinates = self.row_coordinates(rows).await;
        let total = pair_count(rows.len());

        info!("Building {} pairs from {} rows", total, rows.len());
        let pb = progress_bar(total as u64, self.show_progress, "pairs");

        let mut records = Vec::new();
        for (i, j) in pair_indices(rows.len()) {
            pb.inc(1);

            match self
                .build_pair((i, &rows[i]), coordinates[i], (j, &rows[j]), coordinates[j])
                .await
            {
                Ok(record) => records.push(record),
                Err(e @ PairError::MissingCoordinate { .. }) => {
                    debug!("Skipping pair ({}, {}): {}", i, j, e);
                }
                Err(e) => warn!("Skipping pair ({}, {}): {}", i, j, e),
            }
        }

        pb.finish_with_message("pairs complete");
        info!(
            "Built {} of {} pairs ({} skipped)",
            records.len(),
            total,
            total - records.len()
        );

        records
    }
}
