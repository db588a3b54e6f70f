//! Render-facing consumers of the merged entity list.

pub mod geocode;
pub mod icons;
pub mod motion;
pub mod resolver;

pub use geocode::{format_address, AddressBook, AddressRow, AddressState, Geocoder, NominatimGeocoder};
pub use icons::{IconAsset, IconResolver, IconSpec};
pub use motion::{MarkerSink, MotionConfig, MotionInterpolator, MotionSummary, NoopMarkerSink};
pub use resolver::{focus_target, resolve, FocusTarget, FOCUS_MIN_ZOOM};
