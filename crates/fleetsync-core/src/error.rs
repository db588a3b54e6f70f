//! Unified error type for FleetSync Core.

use fleetsync_types::{AccountError, ConfigError, GeocodeError, TrackerError};

use crate::modules::logger::LoggerError;
use serde::Serialize;
use thiserror::Error;

/// Main error type for core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Upstream tracking backend failed for one account.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Account add/remove/validation failed.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Address lookup failed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// Configuration loading or persistence failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tracing subscriber could not be installed.
    #[error(transparent)]
    Logger(#[from] LoggerError),

    /// Upstream SDK could not be constructed.
    #[error("Client error: {0}")]
    Client(#[from] whatsgps_client::ClientError),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for core operations.
pub type AppResult<T> = Result<T, AppError>;
