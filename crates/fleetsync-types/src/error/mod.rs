//! Typed error definitions for FleetSync.
//!
//! Every error here is:
//!
//! - **Serializable** so it can be stored in a cycle snapshot
//! - **Displayable** because the display text is what users see in the
//!   combined per-cycle error message
//! - **Matchable** so the orchestrator can decide on session invalidation

mod account;
mod config;
mod geocode;
mod tracker;

pub use account::AccountError;
pub use config::ConfigError;
pub use geocode::GeocodeError;
pub use tracker::TrackerError;
