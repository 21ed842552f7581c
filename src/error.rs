//! Typed failures for remote lookups and input parsing.

use thiserror::Error;

/// A remote geocoding or routing lookup that produced no usable result.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-OK status.
    #[error("service returned {status}{}", detail(.message))]
    Service {
        status: String,
        message: Option<String>,
        transient: bool,
    },

    #[error("no result for '{0}'")]
    NoResult(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl LookupError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LookupError::Http(e) => e.is_timeout() || e.is_connect(),
            LookupError::Service { transient, .. } => *transient,
            LookupError::NoResult(_) | LookupError::Malformed(_) => false,
        }
    }
}

/// Why a location pair produced no output record.
#[derive(Error, Debug)]
pub enum PairError {
    #[error("no coordinate for row {row} ('{address}')")]
    MissingCoordinate { row: usize, address: String },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// A malformed value in an input table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("malformed coordinate '{0}'")]
    Coordinate(String),

    #[error("coordinate out of range: latitude {lat}, longitude {lng}")]
    OutOfRange { lat: f64, lng: f64 },
}
