//! Tracker account configuration.

use crate::error::AccountError;
use serde::{Deserialize, Serialize};

/// Credential set for one device or fleet on the upstream backend.
///
/// Serialized with the field names of the persisted tracker table
/// (`imei`, `password`, `label`, `color`). Session credentials are never
/// part of this type, so they can never leak into persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountConfig {
    /// Login of the account on the backend (usually the device IMEI)
    #[serde(rename = "imei")]
    pub account_id: String,
    /// Secret exchanged for a session credential
    #[serde(rename = "password")]
    pub secret: String,
    /// Display label; also the source label of the account's entities
    pub label: String,
    /// Optional marker color override (CSS color)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AccountConfig {
    /// Create an account configuration without a color override.
    pub fn new(
        account_id: impl Into<String>,
        secret: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self { account_id: account_id.into(), secret: secret.into(), label: label.into(), color: None }
    }

    /// Set the marker color override.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Trim every text field and reject blank ones.
    pub fn validated(self) -> Result<Self, AccountError> {
        let account_id = self.account_id.trim().to_string();
        let secret = self.secret.trim().to_string();
        let label = self.label.trim().to_string();

        if account_id.is_empty() {
            return Err(AccountError::blank("imei"));
        }
        if secret.is_empty() {
            return Err(AccountError::blank("password"));
        }
        if label.is_empty() {
            return Err(AccountError::blank("label"));
        }

        let color = self.color.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        Ok(Self { account_id, secret, label, color })
    }

    /// Accounts without a login or secret are skipped by polling.
    pub fn has_credentials(&self) -> bool {
        !self.account_id.is_empty() && !self.secret.is_empty()
    }

    /// Two-character uppercase badge drawn on the account's markers.
    pub fn badge(&self) -> String {
        self.label.chars().take(2).collect::<String>().to_uppercase()
    }
}
