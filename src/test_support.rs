//! In-memory [`GeoClient`] for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::LookupError;
use crate::google::{GeoClient, TravelMode};
use crate::models::{Coordinate, TravelSummary};

/// Answers from fixed tables and counts every call.
/// Unknown addresses and pairs fail with [`LookupError::NoResult`].
#[derive(Default)]
pub struct MockGeoClient {
    coordinates: HashMap<String, Coordinate>,
    distances: HashMap<(String, String), TravelSummary>,
    geocode_calls: AtomicUsize,
    distance_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockGeoClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coordinate(mut self, address: &str, lat: f64, lng: f64) -> Self {
        self.coordinates
            .insert(address.to_string(), Coordinate::new(lat, lng));
        self
    }

    pub fn with_distance(
        mut self,
        origin: &str,
        destination: &str,
        distance: u64,
        duration: u64,
    ) -> Self {
        self.distances.insert(
            (origin.to_string(), destination.to_string()),
            TravelSummary { distance, duration },
        );
        self
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }

    pub fn distance_calls(&self) -> usize {
        self.distance_calls.load(Ordering::SeqCst)
    }

    /// Highest number of lookups that were pending at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Hold the lookup open across a few scheduler turns so concurrent
    /// callers overlap.
    async fn hold(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GeoClient for MockGeoClient {
    async fn geocode(&self, address: &str) -> Result<Coordinate, LookupError> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        self.hold().await;
        self.coordinates
            .get(address)
            .copied()
            .ok_or_else(|| LookupError::NoResult(address.to_string()))
    }

    async fn distance(
        &self,
        origin: &str,
        destination: &str,
        _mode: TravelMode,
    ) -> Result<TravelSummary, LookupError> {
        self.distance_calls.fetch_add(1, Ordering::SeqCst);
        self.hold().await;
        self.distances
            .get(&(origin.to_string(), destination.to_string()))
            .copied()
            .ok_or_else(|| LookupError::NoResult(format!("{} -> {}", origin, destination)))
    }
}
