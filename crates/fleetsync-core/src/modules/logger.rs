//! Tracing subscriber setup.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Invalid log filter {filter:?}: {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("Failed to install tracing subscriber: {0}")]
    AlreadyInstalled(String),
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Calling this twice is an
/// error from the second call on; the first subscriber stays installed.
pub fn init(default_level: &str) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| LoggerError::InvalidFilter { filter: default_level.to_string(), message: e.to_string() })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| LoggerError::AlreadyInstalled(e.to_string()))
}

/// Subscriber for tests; output is captured by the test harness.
#[cfg(test)]
pub(crate) fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
