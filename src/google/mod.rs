//! Google Maps web services: geocoding and distance matrix.
//!
//! [`GeoClient`] is the seam the pipeline components talk to;
//! [`GoogleMapsClient`] is the HTTP implementation.

mod client;
mod response;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::models::{Coordinate, TravelSummary};

pub use client::{ClientConfig, GoogleMapsClient, API_KEY_ENV, DEFAULT_BASE_URL};

/// Travel mode passed to the distance matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote geocoding and routing lookups.
#[async_trait]
pub trait GeoClient: Send + Sync {
    /// Coordinate of the first match for `address`.
    async fn geocode(&self, address: &str) -> Result<Coordinate, LookupError>;

    /// Routed distance and duration for a single origin/destination pair.
    async fn distance(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<TravelSummary, LookupError>;
}
