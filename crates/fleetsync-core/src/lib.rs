//! # FleetSync Core
//!
//! Live-position synchronization engine.
//!
//! ```text
//! fleetsync-core/src/
//! ├── dashboard.rs      # Rendering-surface facade (focus, icons, addresses)
//! ├── sync/             # Polling orchestrator and everything it drives
//! │   ├── backend.rs    # TrackingBackend seam (WhatsGPS impl)
//! │   ├── session.rs    # Per-account session credential cache
//! │   ├── classify.rs   # Auth-class failure heuristic
//! │   ├── normalizer.rs # Raw report -> TrackedEntity
//! │   └── poller/       # Concurrent cycle + interval loop
//! ├── map/              # Render-facing consumers of the merged list
//! │   ├── resolver.rs   # Tiered focus search
//! │   ├── motion/       # Per-entity marker interpolation tasks
//! │   ├── icons.rs      # Cached marker icon assets
//! │   └── geocode.rs    # Cached reverse geocoding
//! └── modules/          # Config, logging, account registry, persistence
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp))]

pub mod dashboard;
pub mod error;
pub mod map;
pub mod modules;
pub mod sync;

pub use dashboard::{Dashboard, FocusOutcome};
pub use error::{AppError, AppResult};
pub use map::{
    resolve, AddressBook, AddressState, FocusTarget, Geocoder, IconResolver, MarkerSink,
    MotionConfig, MotionInterpolator, NominatimGeocoder, NoopMarkerSink,
};
pub use modules::{AccountRegistry, AccountStore, FleetConfig, JsonFileStore, PersistenceQueue};
pub use sync::{
    CycleReport, FleetSnapshot, Poller, PollerHandle, PollingConfig, SessionCache, TrackingBackend,
};
