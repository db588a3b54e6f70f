//! Wiring of the engine for one CLI invocation.

use fleetsync_core::modules::config::{get_data_dir, load_config};
use fleetsync_core::{
    AccountRegistry, AccountStore, AddressBook, AppResult, Dashboard, FleetConfig, JsonFileStore,
    MarkerSink, MotionInterpolator, NominatimGeocoder, PersistenceQueue, Poller,
};
use fleetsync_types::LatLng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use whatsgps_client::WhatsGpsClient;

use crate::cli::Cli;

/// Marker sink for a terminal: moves are only traced.
struct TracingMarkerSink;

impl MarkerSink for TracingMarkerSink {
    fn move_marker(&self, id: &str, position: LatLng) {
        tracing::trace!("[marker] {} -> {:.6},{:.6}", id, position.lat, position.lng);
    }

    fn remove_marker(&self, id: &str) {
        tracing::debug!("[marker] {} left the map", id);
    }
}

pub struct AppContext {
    pub data_dir: PathBuf,
    pub config: FleetConfig,
    pub registry: AccountRegistry,
    pub poller: Arc<Poller>,
    pub dashboard: Dashboard,
    writer: JoinHandle<()>,
}

impl AppContext {
    pub async fn load(cli: &Cli) -> AppResult<Self> {
        let data_dir = match &cli.data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.clone()
            },
            None => get_data_dir()?,
        };

        let mut config = load_config(&data_dir)?;
        config.apply_env_overrides();
        if let Some(ms) = cli.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = cli.animation_ms {
            config.animation_ms = ms;
        }
        config.validate()?;

        let store = Arc::new(JsonFileStore::new(&data_dir));
        let stored = match store.load_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!("Could not load trackers from {}: {}", store.path().display(), e);
                Vec::new()
            },
        };
        tracing::debug!("{} stored tracker(s) loaded", stored.len());

        let (queue, writer) = PersistenceQueue::spawn(store, config.persist_debounce());
        let registry = AccountRegistry::with_persistence(config.static_accounts(), stored, queue);

        let client = WhatsGpsClient::new(config.client())?;
        let poller = Poller::new(Arc::new(client), registry.clone(), config.polling());

        let geocoder = NominatimGeocoder::new(
            &config.geocode_url,
            &config.geocode_language,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        let dashboard = Dashboard::new(
            registry.clone(),
            poller.subscribe(),
            MotionInterpolator::new(Arc::new(TracingMarkerSink), config.motion()),
            AddressBook::new(Arc::new(geocoder), config.geocode_ttl()),
        );

        Ok(Self { data_dir, config, registry, poller, dashboard, writer })
    }

    /// Flush pending tracker writes and wait for the writer to finish.
    pub async fn shutdown(self) {
        let Self { registry, poller, dashboard, writer, .. } = self;
        drop(dashboard);
        drop(poller);
        drop(registry);
        if let Err(e) = writer.await {
            tracing::warn!("Tracker writer ended abnormally: {}", e);
        }
    }
}
