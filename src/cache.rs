//! Address → coordinate memoization over a [`GeoClient`].

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use futures::StreamExt;
use hashbrown::{HashMap, HashSet};
use tracing::{info, warn};

use crate::google::GeoClient;
use crate::models::Coordinate;
use crate::progress::progress_bar;

/// Coordinates resolved during one run.
///
/// Entries are insert-only: a coordinate cached for an address is never replaced.
/// Failed lookups are not cached; the address is appended to a failure list instead.
pub struct CoordinateCache {
    client: Arc<dyn GeoClient>,
    coordinates: RwLock<HashMap<String, Coordinate>>,
    failed: Mutex<Vec<String>>,
    show_progress: bool,
}

impl CoordinateCache {
    pub fn new(client: Arc<dyn GeoClient>) -> Self {
        Self {
            client,
            coordinates: RwLock::new(HashMap::new()),
            failed: Mutex::new(Vec::new()),
            show_progress: false,
        }
    }

    /// Show a progress bar during [`resolve_many`](Self::resolve_many)
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Cached coordinate, without touching the remote service
    pub fn get(&self, address: &str) -> Option<Coordinate> {
        self.coordinates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .copied()
    }

    /// Seed an entry. Returns the coordinate now cached for `address`,
    /// which is the existing one if the address was already present.
    pub fn insert(&self, address: &str, coordinate: Coordinate) -> Coordinate {
        *self
            .coordinates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(address.to_string())
            .or_insert(coordinate)
    }

    pub fn len(&self) -> usize {
        self.coordinates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Addresses whose lookup failed, in the order they failed
    pub fn failed_addresses(&self) -> Vec<String> {
        self.failed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cached coordinate, or a single remote lookup on a miss.
    ///
    /// A failed lookup returns `None` and records the address as failed.
    pub async fn resolve(&self, address: &str) -> Option<Coordinate> {
        if let Some(coordinate) = self.get(address) {
            return Some(coordinate);
        }

        match self.client.geocode(address).await {
            Ok(coordinate) => Some(self.insert(address, coordinate)),
            Err(e) => {
                warn!("Geocoding failed for '{}': {}", address, e);
                self.failed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(address.to_string());
                None
            }
        }
    }

    /// Resolve every distinct, not yet cached address with at most
    /// `concurrency` lookups in flight. Failures never abort the batch.
    pub async fn resolve_many<I, S>(&self, addresses: I, concurrency: usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let pending: Vec<String> = addresses
            .into_iter()
            .filter_map(|a| {
                let a = a.as_ref();
                (seen.insert(a.to_string()) && self.get(a).is_none()).then(|| a.to_string())
            })
            .collect();

        if pending.is_empty() {
            return;
        }

        info!(
            "Geocoding {} addresses ({} concurrent)",
            pending.len(),
            concurrency.max(1)
        );

        let pb = progress_bar(pending.len() as u64, self.show_progress, "geocoding");

        let mut lookups = futures::stream::iter(&pending)
            .map(|address| self.resolve(address))
            .buffer_unordered(concurrency.max(1));

        let mut resolved = 0usize;
        while let Some(result) = lookups.next().await {
            if result.is_some() {
                resolved += 1;
            }
            pb.inc(1);
        }

        pb.finish_with_message("geocoding complete");
        info!(
            "Geocoded {} of {} addresses ({} failed)",
            resolved,
            pending.len(),
            pending.len() - resolved
        );
    }
}
