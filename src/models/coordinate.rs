//! Latitude/longitude pair and its textual form.

use std::fmt;
use std::str::FromStr;

use geo::{Distance, Geodesic, Point};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// Geographic coordinate in decimal degrees.
///
/// Serialized as `"(lat, lng)"`, the form stored in the `Coordinate` column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `geo` point (x = longitude, y = latitude)
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }

    /// Distance over the WGS84 ellipsoid in kilometers.
    pub fn geodesic_km(self, other: Coordinate) -> f64 {
        Geodesic.distance(self.to_point(), other.to_point()) / 1000.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

impl FromStr for Coordinate {
    type Err = ParseError;

    /// Accepts `"(lat, lng)"` or `"lat,lng"`, whitespace tolerant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseError::Coordinate(s.to_string());

        let trimmed = s.trim();
        let inner = match (trimmed.strip_prefix('('), trimmed.strip_suffix(')')) {
            (Some(_), Some(_)) => &trimmed[1..trimmed.len() - 1],
            (None, None) => trimmed,
            _ => return Err(malformed()),
        };

        let (lat, lng) = inner.split_once(',').ok_or_else(malformed)?;
        let lat: f64 = lat.trim().parse().map_err(|_| malformed())?;
        let lng: f64 = lng.trim().parse().map_err(|_| malformed())?;

        if !lat.is_finite() || !lng.is_finite() {
            return Err(malformed());
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(ParseError::OutOfRange { lat, lng });
        }

        Ok(Self { lat, lng })
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
