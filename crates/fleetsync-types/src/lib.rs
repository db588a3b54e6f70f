//! # FleetSync Types
//!
//! Core models and error definitions shared by the FleetSync crates.
//!
//! - **`error`** - Typed error hierarchy for tracker accounts, backend calls,
//!   address lookup and configuration
//! - **`models`** - Domain models (account configuration, session credential,
//!   tracked entity, per-account fetch outcome, address record)
//!
//! ## Architecture Role
//!
//! ```text
//!              fleetsync-types (this crate)
//!                      │
//!        ┌─────────────┴─────────────┐
//!        ▼                           ▼
//!  whatsgps-client  ────────▶  fleetsync-core
//!                                    │
//!                                    ▼
//!                              fleetsync-cli
//! ```
//!
//! All types are:
//! - **Serializable** via serde for persistence and logging
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

pub use error::{AccountError, ConfigError, GeocodeError, TrackerError};

pub use models::{
    AccountConfig, AddressDetails, AddressRecord, FetchOutcome, FocusQuery, LatLng,
    SessionCredential, TrackedEntity,
};
