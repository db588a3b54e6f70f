//! Canonical tracked entity and focus query.

use super::LatLng;
use serde::{Deserialize, Serialize};

/// One vehicle's current reported state, normalized across backend versions.
///
/// `id` is `"{source}::{raw_id}"` and stays stable across polling cycles for
/// the same device under the same account. Coordinates may be non-finite;
/// such entities are kept in the merged list but never rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedEntity {
    pub id: String,
    pub raw_id: String,
    pub source: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

impl TrackedEntity {
    pub const fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Only entities with finite coordinates are rendered.
    pub fn is_renderable(&self) -> bool {
        self.position().is_finite()
    }
}

/// User focus request: a display label, a device identifier, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FocusQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
}

impl FocusQuery {
    pub fn by_label(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), imei: None }
    }

    pub fn by_imei(imei: impl Into<String>) -> Self {
        Self { label: None, imei: Some(imei.into()) }
    }

    /// A bare identifier is used as both label and imei.
    pub fn from_identifier(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self { label: Some(identifier.clone()), imei: Some(identifier) }
    }

    /// Selection key used when nothing could be resolved.
    pub fn selection_key(&self) -> Option<&str> {
        self.label.as_deref().or(self.imei.as_deref())
    }
}
