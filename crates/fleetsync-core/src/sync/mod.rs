//! Live-position synchronization: sessions, backend calls, normalization
//! and the polling orchestrator.

mod backend;
mod classify;
mod normalizer;
mod poller;
mod session;

pub use backend::TrackingBackend;
pub use classify::is_session_failure;
pub use normalizer::{merge_outcomes, normalize};
pub use poller::{CycleReport, FleetSnapshot, Poller, PollerHandle, PollingConfig};
pub use session::SessionCache;
