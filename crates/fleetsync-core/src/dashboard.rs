//! Rendering-surface entry point.
//!
//! Bundles everything a map front end needs around the published fleet
//! snapshot: marker motion, icons, address popups, account management and
//! the focus selection.

use fleetsync_types::{AccountConfig, AccountError, FocusQuery, TrackedEntity};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

use crate::map::{
    focus_target, resolve, AddressBook, AddressState, FocusTarget, IconAsset, IconResolver,
    MotionInterpolator, MotionSummary,
};
use crate::modules::AccountRegistry;
use crate::sync::FleetSnapshot;

/// Result of a focus request.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusOutcome {
    /// New selection: the entity id on a hit, otherwise the query's label or imei
    pub selection: Option<String>,
    /// Fly-to target; `None` when nothing with a finite position matched
    pub target: Option<FocusTarget>,
}

pub struct Dashboard {
    registry: AccountRegistry,
    snapshots: watch::Receiver<FleetSnapshot>,
    motion: MotionInterpolator,
    icons: IconResolver,
    addresses: AddressBook,
    selection: Mutex<Option<String>>,
}

impl Dashboard {
    pub fn new(
        registry: AccountRegistry,
        snapshots: watch::Receiver<FleetSnapshot>,
        motion: MotionInterpolator,
        addresses: AddressBook,
    ) -> Self {
        let icons = IconResolver::new();
        icons.set_accounts(&registry.dynamic_accounts());
        Self { registry, snapshots, motion, icons, addresses, selection: Mutex::new(None) }
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next published snapshot and reconcile markers with it.
    /// Returns `None` once the poller is gone.
    pub async fn next_update(&mut self) -> Option<(FleetSnapshot, MotionSummary)> {
        self.snapshots.changed().await.ok()?;
        let snapshot = self.snapshots.borrow_and_update().clone();
        if snapshot.loading {
            return Some((snapshot, MotionSummary::default()));
        }
        let summary = self.motion.apply(&snapshot.entities);
        Some((snapshot, summary))
    }

    /// Reconcile markers with whatever snapshot is current.
    pub fn sync_markers(&self) -> MotionSummary {
        let entities = Arc::clone(&self.snapshots.borrow().entities);
        self.motion.apply(&entities)
    }

    pub fn motion(&self) -> &MotionInterpolator {
        &self.motion
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    pub fn add_account(&self, account: AccountConfig) -> Result<AccountConfig, AccountError> {
        let added = self.registry.add(account)?;
        self.icons.set_accounts(&self.registry.dynamic_accounts());
        Ok(added)
    }

    /// Remove a user account; clears the selection if it pointed at that label.
    pub fn remove_account(&self, label: &str) -> Result<AccountConfig, AccountError> {
        let removed = self.registry.remove(label)?;
        self.icons.set_accounts(&self.registry.dynamic_accounts());

        let mut selection = self.selection.lock();
        if selection.as_deref() == Some(removed.label.as_str()) {
            *selection = None;
        }
        Ok(removed)
    }

    /// Resolve a focus request against the current snapshot.
    pub fn focus(&self, query: &FocusQuery, current_zoom: u8) -> FocusOutcome {
        let snapshot = self.snapshot();
        let accounts = self.registry.snapshot();
        let target = resolve(query, &snapshot.entities, &accounts).and_then(|e| focus_target(e, current_zoom));

        let selection = match &target {
            Some(target) => Some(target.entity_id.clone()),
            None => query.selection_key().map(str::to_string),
        };
        *self.selection.lock() = selection.clone();

        match &target {
            Some(t) => tracing::debug!("Focus on {} at {:.5},{:.5} z{}", t.entity_id, t.lat, t.lng, t.zoom),
            None => tracing::debug!("Focus query {:?} matched nothing on the map", query),
        }
        FocusOutcome { selection, target }
    }

    pub fn selection(&self) -> Option<String> {
        self.selection.lock().clone()
    }

    pub fn clear_selection(&self) {
        *self.selection.lock() = None;
    }

    pub fn icon_for(&self, entity: &TrackedEntity) -> Arc<IconAsset> {
        self.icons.icon_for(entity)
    }

    /// Address of an entity in the current snapshot; `None` if the id is unknown.
    pub async fn address_for(&self, entity_id: &str) -> Option<AddressState> {
        let position = self.snapshot().entities.iter().find(|e| e.id == entity_id)?.position();
        Some(self.addresses.lookup(entity_id, position).await)
    }
}
