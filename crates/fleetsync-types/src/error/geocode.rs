//! Reverse-geocoding errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address lookup failure. Scoped to a single entity's details view.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum GeocodeError {
    /// Coordinates are not finite numbers
    #[error("Cannot geocode non-finite coordinates")]
    InvalidCoordinates,

    /// HTTP request could not be completed
    #[error("Geocode request failed: {message}")]
    Request {
        /// Transport error description
        message: String,
    },

    /// Service answered with a non-success status
    #[error("Geocode failed: {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Response body was not a valid address record
    #[error("Geocode response invalid: {message}")]
    Parse {
        /// Parse error description
        message: String,
    },
}
