//! Polling orchestrator.
//!
//! One cycle polls every configured account concurrently, merges the
//! successful results into a fresh entity list and joins the failures into
//! one message. Cycles repeat on a fixed interval and also run immediately
//! after the account list changes.
//!
//! ```text
//! IDLE ──tick──▶ FETCHING ──all accounts resolved──▶ MERGED ──publish──▶ (sleep) ──▶ FETCHING
//! ```

mod cycle;


use chrono::{DateTime, Utc};
use fleetsync_types::{FetchOutcome, TrackedEntity};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::backend::TrackingBackend;
use super::session::SessionCache;
use crate::modules::AccountRegistry;

pub use cycle::CycleReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Time between cycle starts.
    pub interval: Duration,
    /// Upper bound for one account's authenticate + fetch within a cycle.
    pub account_timeout: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval: Duration::from_millis(15_000), account_timeout: Duration::from_millis(15_000) }
    }
}

/// Latest published state of the fleet.
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    /// Number of the cycle that produced this snapshot (0 = none yet)
    pub cycle: u64,
    pub entities: Arc<Vec<TrackedEntity>>,
    /// Pipe-joined per-account failures; `None` when every account succeeded
    pub error: Option<String>,
    pub outcomes: Vec<FetchOutcome>,
    pub completed_at: Option<DateTime<Utc>>,
    /// A cycle is currently in flight
    pub loading: bool,
}

impl FleetSnapshot {
    /// Entities that can be placed on the map.
    pub fn renderable(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entities.iter().filter(|e| e.is_renderable())
    }
}

pub struct Poller {
    backend: Arc<dyn TrackingBackend>,
    registry: AccountRegistry,
    sessions: SessionCache,
    config: PollingConfig,
    snapshot_tx: watch::Sender<FleetSnapshot>,
    cycles: AtomicU64,
}

impl Poller {
    pub fn new(
        backend: Arc<dyn TrackingBackend>,
        registry: AccountRegistry,
        config: PollingConfig,
    ) -> Arc<Self> {
        let (snapshot_tx, _) =
            watch::channel(FleetSnapshot { loading: true, ..FleetSnapshot::default() });
        let sessions = registry.sessions().clone();
        Arc::new(Self { backend, registry, sessions, config, snapshot_tx, cycles: AtomicU64::new(0) })
    }

    pub fn subscribe(&self) -> watch::Receiver<FleetSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    pub fn config(&self) -> PollingConfig {
        self.config
    }

    /// Run one cycle and publish its result.
    pub async fn refresh(&self) -> CycleReport {
        let report = self.run_cycle().await;
        self.publish(&report);
        report
    }

    /// Replace the published snapshot with a finished cycle.
    pub fn publish(&self, report: &CycleReport) {
        let snapshot = FleetSnapshot {
            cycle: report.cycle,
            entities: Arc::new(report.entities.clone()),
            error: report.error.clone(),
            outcomes: report.outcomes.clone(),
            completed_at: Some(Utc::now()),
            loading: false,
        };
        self.snapshot_tx.send_replace(snapshot);
    }

    fn next_cycle(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Start the interval loop as a background task.
    ///
    /// The first cycle runs immediately. A cycle that finishes after
    /// [`PollerHandle::stop`] is discarded instead of published.
    pub fn start(self: &Arc<Self>) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let mut changes = self.registry.subscribe_changes();
        let poller = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poller.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                "Polling started: every {} ms across {} account(s)",
                poller.config.interval.as_millis(),
                poller.registry.len()
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {},
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        tracing::debug!("Account list changed, polling now");
                        ticker.reset();
                    },
                    _ = shutdown_rx.changed() => break,
                }

                let report = poller.run_cycle().await;

                if *shutdown_rx.borrow() {
                    tracing::debug!("Discarding cycle {} finished after shutdown", report.cycle);
                    break;
                }
                poller.publish(&report);
            }

            tracing::info!("Polling stopped");
        });

        PollerHandle { shutdown_tx, task }
    }
}

/// Owner of a running polling loop.
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop scheduling new cycles. An in-flight cycle finishes but is not published.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            tracing::warn!("Polling task ended abnormally: {}", e);
        }
    }
}
