//! Account configuration errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while adding, removing or validating tracker accounts.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum AccountError {
    /// Account with the given label not found
    #[error("Account not found: {label}")]
    NotFound {
        /// Display label of the missing account
        label: String,
    },

    /// Label belongs to a statically configured account
    #[error("Label {label} is reserved for a static account")]
    ReservedLabel {
        /// The reserved label
        label: String,
    },

    /// A required field is missing or blank
    #[error("Validation error for {field}: {message}")]
    ValidationError {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}

impl AccountError {
    /// Shorthand for a blank required field.
    pub fn blank(field: &str) -> Self {
        Self::ValidationError { field: field.to_string(), message: "must not be empty".to_string() }
    }
}
