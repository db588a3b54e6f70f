//! Domain models for FleetSync.

mod account;
mod address;
mod entity;
mod fetch;
mod geo;
mod session;

pub use account::AccountConfig;
pub use address::{AddressDetails, AddressRecord};
pub use entity::{FocusQuery, TrackedEntity};
pub use fetch::FetchOutcome;
pub use geo::LatLng;
pub use session::SessionCredential;
