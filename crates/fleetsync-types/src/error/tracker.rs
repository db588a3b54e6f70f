//! Errors raised while talking to the upstream tracking backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-account failure of one polling cycle.
///
/// The display text of each variant is what ends up in the combined,
/// pipe-joined error message of a cycle.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum TrackerError {
    /// Credential exchange failed for every login variant, or the account
    /// has no usable credentials.
    #[error("Authentication failed for {account}: {message}")]
    Auth {
        /// Label of the account
        account: String,
        /// Diagnostic summary of the failed attempts
        message: String,
    },

    /// Backend rejected the session (expired or invalid token).
    /// The cached session credential must be dropped.
    #[error("Session expired for {account}: {payload}")]
    SessionExpired {
        /// Label of the account
        account: String,
        /// Raw error payload returned by the backend
        payload: String,
    },

    /// Backend returned a non-success response unrelated to the session.
    #[error("Backend error for {account}: {payload}")]
    Api {
        /// Label of the account
        account: String,
        /// Raw error payload returned by the backend
        payload: String,
    },

    /// Transport-level failure (DNS, TLS, connection reset, bad body).
    #[error("Network error for {account}: {message}")]
    Network {
        /// Label of the account
        account: String,
        /// Transport error description
        message: String,
    },

    /// The account attempt did not finish within the request timeout.
    #[error("Request for {account} timed out after {timeout_ms} ms")]
    Timeout {
        /// Label of the account
        account: String,
        /// Timeout that elapsed
        timeout_ms: u64,
    },
}

impl TrackerError {
    /// Label of the account the failure belongs to.
    pub fn account(&self) -> &str {
        match self {
            Self::Auth { account, .. }
            | Self::SessionExpired { account, .. }
            | Self::Api { account, .. }
            | Self::Network { account, .. }
            | Self::Timeout { account, .. } => account,
        }
    }

    /// Whether the cached session credential of the account must be dropped
    /// so the next cycle re-authenticates.
    pub const fn invalidates_session(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_session_expiry_invalidates() {
        let expired = TrackerError::SessionExpired {
            account: "A".to_string(),
            payload: "please login".to_string(),
        };
        let api = TrackerError::Api { account: "A".to_string(), payload: "boom".to_string() };
        let auth = TrackerError::Auth { account: "A".to_string(), message: "nope".to_string() };

        assert!(expired.invalidates_session());
        assert!(!api.invalidates_session());
        assert!(!auth.invalidates_session());
        assert_eq!(api.account(), "A");
    }
}
