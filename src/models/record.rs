//! Table rows read from and written to delimited files.

use serde::{Deserialize, Serialize};

use super::Coordinate;
use crate::error::ParseError;

/// One location row of the input table.
///
/// `Coordinate` is kept in its serialized form; it is parsed when a pair is built
/// so a malformed value fails only this row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    #[serde(rename = "Address")]
    pub address: String,

    #[serde(rename = "Borough", default)]
    pub borough: String,

    #[serde(rename = "Coordinate", default)]
    pub coordinate: String,
}

impl LocationRow {
    pub fn new(address: &str, borough: &str, coordinate: &str) -> Self {
        Self {
            address: address.to_string(),
            borough: borough.to_string(),
            coordinate: coordinate.to_string(),
        }
    }

    /// Parse the serialized coordinate
    pub fn parse_coordinate(&self) -> Result<Coordinate, ParseError> {
        self.coordinate.parse()
    }
}

/// One row of the pairwise output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPairRecord {
    pub origin_address: String,
    pub origin_borough: String,
    pub origin_coordinate: Coordinate,
    pub destination_address: String,
    pub destination_borough: String,
    pub is_same_borough: bool,
    pub destination_coordinate: Coordinate,
    /// Kilometers over the ellipsoid
    pub geodesic_distance: f64,
    /// Routed meters
    pub google_distance: u64,
    /// Routed seconds
    pub google_duration: u64,
}
