//! Configuration and persistence errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration or persisting
/// user-added tracker accounts. None of them ever stops live polling.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// No usable data directory could be resolved
    #[error("Data directory unavailable: {message}")]
    NoDataDir {
        /// Why the directory could not be resolved or created
        message: String,
    },

    /// Config or account file could not be parsed
    #[error("Config parse error: {message}")]
    ParseError {
        /// Description of the parse failure
        message: String,
    },

    /// Config value is invalid
    #[error("Config validation error for {field}: {message}")]
    ValidationError {
        /// Name of the offending field
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// Reading persisted state failed
    #[error("Config read error: {message}")]
    ReadError {
        /// Description of the read failure
        message: String,
    },

    /// Writing persisted state failed (permission denied, disk full, ...)
    #[error("Config write error: {message}")]
    WriteError {
        /// Description of the write failure
        message: String,
    },
}

impl ConfigError {
    /// Create a parse error from a serde_json error.
    pub fn from_json_error(e: &serde_json::Error) -> Self {
        Self::ParseError { message: e.to_string() }
    }

    /// Create a write error from an IO error.
    pub fn from_io_error(e: &std::io::Error) -> Self {
        Self::WriteError { message: e.to_string() }
    }
}
