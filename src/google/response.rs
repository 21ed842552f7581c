//! Response bodies of the Geocoding and Distance Matrix APIs.

use serde::Deserialize;

use crate::error::LookupError;
use crate::models::{Coordinate, TravelSummary};

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: u64,
}

/// Map a non-OK service status onto a lookup error.
fn status_error(status: &str, message: Option<String>, query: &str) -> LookupError {
    match status {
        "ZERO_RESULTS" | "NOT_FOUND" => LookupError::NoResult(query.to_string()),
        "OVER_QUERY_LIMIT" | "UNKNOWN_ERROR" => LookupError::Service {
            status: status.to_string(),
            message,
            transient: true,
        },
        _ => LookupError::Service {
            status: status.to_string(),
            message,
            transient: false,
        },
    }
}

impl GeocodeResponse {
    pub(crate) fn into_coordinate(self, address: &str) -> Result<Coordinate, LookupError> {
        if self.status != "OK" {
            return Err(status_error(&self.status, self.error_message, address));
        }

        let location = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NoResult(address.to_string()))?
            .geometry
            .location;

        Ok(Coordinate::new(location.lat, location.lng))
    }
}

impl DistanceMatrixResponse {
    pub(crate) fn into_summary(
        self,
        origin: &str,
        destination: &str,
    ) -> Result<TravelSummary, LookupError> {
        let query = format!("{} -> {}", origin, destination);

        if self.status != "OK" {
            return Err(status_error(&self.status, self.error_message, &query));
        }

        // 1:1 query: exactly one row with one element
        let element = self
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| LookupError::Malformed(format!("empty matrix for {}", query)))?;

        if element.status != "OK" {
            return Err(status_error(&element.status, None, &query));
        }

        match (element.distance, element.duration) {
            (Some(distance), Some(duration)) => Ok(TravelSummary {
                distance: distance.value,
                duration: duration.value,
            }),
            _ => Err(LookupError::Malformed(format!(
                "element without distance/duration for {}",
                query
            ))),
        }
    }
}
