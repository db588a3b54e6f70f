//! Per-account result of one polling cycle.

use super::TrackedEntity;
use crate::error::TrackerError;
use serde::{Deserialize, Serialize};

/// Outcome of one account's authenticate + fetch attempt within a cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchOutcome {
    /// Label of the account the outcome belongs to
    pub label: String,
    pub success: bool,
    pub entities: Vec<TrackedEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TrackerError>,
}

impl FetchOutcome {
    pub fn success(label: impl Into<String>, entities: Vec<TrackedEntity>) -> Self {
        Self { label: label.into(), success: true, entities, error: None }
    }

    /// Trivial success for accounts that have no credentials configured.
    pub fn skipped(label: impl Into<String>) -> Self {
        Self::success(label, Vec::new())
    }

    pub fn failure(error: TrackerError) -> Self {
        Self { label: error.account().to_string(), success: false, entities: Vec::new(), error: Some(error) }
    }

    /// User-visible failure message, if the attempt failed.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}
