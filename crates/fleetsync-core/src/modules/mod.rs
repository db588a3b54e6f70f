//! Configuration, logging, account registry and persistence modules.

pub mod config;
pub mod logger;
pub mod persistence;
pub mod registry;

pub use config::{get_data_dir, FleetConfig};
pub use persistence::{AccountStore, JsonFileStore, PersistenceQueue};
pub use registry::AccountRegistry;
