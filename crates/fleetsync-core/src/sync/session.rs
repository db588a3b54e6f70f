//! Per-account session credential cache.
//!
//! One slot per account label: absent until a login succeeds, dropped again
//! when a fetch fails with an auth-class error. Never persisted.

use dashmap::DashMap;
use fleetsync_types::SessionCredential;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct SessionCache {
    sessions: Arc<DashMap<String, SessionCredential>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usable credential for the account, if any.
    pub fn get(&self, label: &str) -> Option<SessionCredential> {
        self.sessions.get(label).map(|s| s.clone()).filter(SessionCredential::is_usable)
    }

    pub fn store(&self, label: &str, session: SessionCredential) {
        self.sessions.insert(label.to_string(), session);
    }

    /// Drop the account's credential so the next cycle re-authenticates.
    pub fn invalidate(&self, label: &str) -> bool {
        let removed = self.sessions.remove(label).is_some();
        if removed {
            tracing::warn!("Session for {} invalidated, re-authenticating next cycle", label);
        }
        removed
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
