//! Error types for the WhatsGPS client.

use thiserror::Error;

/// Errors that can occur when using the WhatsGPS client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configured base URL is not a valid absolute URL.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Username or password is empty; no request was made.
    #[error("Username or password is empty")]
    MissingCredentials,

    /// Every login variant was tried and none was accepted.
    #[error("Login rejected after {attempts} attempts (last reply: {})", last_reply.as_deref().unwrap_or("none"))]
    LoginRejected {
        /// Number of variants tried.
        attempts: usize,
        /// Body or error of the last attempt, for diagnostics.
        last_reply: Option<String>,
    },

    /// HTTP request failed.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered but did not report success.
    #[error("Backend error ({status}): {payload}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        payload: String,
    },
}
