//! Session credential model.

use serde::{Deserialize, Serialize};

/// Short-lived token pair returned by a successful login.
///
/// Held in memory only; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionCredential {
    /// Token sent with every position request
    pub token: String,
    /// Backend user id whose devices are fetched
    pub user_id: String,
}

impl SessionCredential {
    /// Create a session credential.
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { token: token.into(), user_id: user_id.into() }
    }

    /// A credential is usable only when both halves are present.
    pub fn is_usable(&self) -> bool {
        !self.token.is_empty() && !self.user_id.is_empty()
    }
}
