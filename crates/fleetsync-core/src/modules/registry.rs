//! Configured accounts: the static pair from configuration plus the
//! user-added list.
//!
//! Labels are unique across both lists. Every mutation bumps a revision on a
//! watch channel (the poller reacts with an immediate cycle) and hands the
//! new dynamic list to the persistence queue.

use fleetsync_types::{AccountConfig, AccountError, SessionCredential};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

use super::persistence::PersistenceQueue;
use crate::sync::SessionCache;

#[derive(Clone)]
pub struct AccountRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    static_accounts: Vec<AccountConfig>,
    dynamic: RwLock<Vec<AccountConfig>>,
    sessions: SessionCache,
    revision: watch::Sender<u64>,
    persistence: Option<PersistenceQueue>,
}

impl AccountRegistry {
    pub fn new(static_accounts: Vec<AccountConfig>, dynamic: Vec<AccountConfig>) -> Self {
        Self::build(static_accounts, dynamic, None)
    }

    /// Registry whose dynamic list is written through `queue` on every change.
    pub fn with_persistence(
        static_accounts: Vec<AccountConfig>,
        dynamic: Vec<AccountConfig>,
        queue: PersistenceQueue,
    ) -> Self {
        Self::build(static_accounts, dynamic, Some(queue))
    }

    fn build(
        static_accounts: Vec<AccountConfig>,
        dynamic: Vec<AccountConfig>,
        persistence: Option<PersistenceQueue>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        let dynamic: Vec<AccountConfig> = dynamic
            .into_iter()
            .filter(|a| {
                let reserved = static_accounts.iter().any(|s| s.label == a.label);
                if reserved {
                    tracing::warn!("Ignoring stored tracker with reserved label {}", a.label);
                }
                !reserved
            })
            .collect();

        Self {
            inner: Arc::new(RegistryInner {
                static_accounts,
                dynamic: RwLock::new(dynamic),
                sessions: SessionCache::new(),
                revision,
                persistence,
            }),
        }
    }

    /// All accounts, static first, in a stable order.
    pub fn snapshot(&self) -> Vec<AccountConfig> {
        let dynamic = self.inner.dynamic.read();
        self.inner.static_accounts.iter().chain(dynamic.iter()).cloned().collect()
    }

    pub fn static_accounts(&self) -> &[AccountConfig] {
        &self.inner.static_accounts
    }

    pub fn dynamic_accounts(&self) -> Vec<AccountConfig> {
        self.inner.dynamic.read().clone()
    }

    pub fn find(&self, label: &str) -> Option<AccountConfig> {
        if let Some(account) = self.inner.static_accounts.iter().find(|a| a.label == label) {
            return Some(account.clone());
        }
        self.inner.dynamic.read().iter().find(|a| a.label == label).cloned()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.find(label).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.static_accounts.len() + self.inner.dynamic.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.inner.sessions
    }

    /// Revision counter, bumped on every add/remove.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Add a user account, or replace the one with the same label.
    ///
    /// Fields are trimmed and must be non-blank. Replacing drops the old
    /// session so the next cycle logs in with the new credentials.
    pub fn add(&self, account: AccountConfig) -> Result<AccountConfig, AccountError> {
        let account = account.validated()?;
        if self.inner.static_accounts.iter().any(|s| s.label == account.label) {
            return Err(AccountError::ReservedLabel { label: account.label });
        }

        let snapshot = {
            let mut dynamic = self.inner.dynamic.write();
            match dynamic.iter_mut().find(|a| a.label == account.label) {
                Some(existing) => {
                    tracing::info!("Replacing tracker {}", account.label);
                    *existing = account.clone();
                },
                None => {
                    tracing::info!("Adding tracker {}", account.label);
                    dynamic.push(account.clone());
                },
            }
            self.inner.sessions.invalidate(&account.label);
            dynamic.clone()
        };

        self.changed(snapshot);
        Ok(account)
    }

    /// Remove a user account and its session.
    pub fn remove(&self, label: &str) -> Result<AccountConfig, AccountError> {
        let label = label.trim();
        if self.inner.static_accounts.iter().any(|s| s.label == label) {
            return Err(AccountError::ReservedLabel { label: label.to_string() });
        }

        let (removed, snapshot) = {
            let mut dynamic = self.inner.dynamic.write();
            let index = dynamic
                .iter()
                .position(|a| a.label == label)
                .ok_or_else(|| AccountError::NotFound { label: label.to_string() })?;
            let removed = dynamic.remove(index);
            self.inner.sessions.invalidate(&removed.label);
            (removed, dynamic.clone())
        };

        tracing::info!("Removed tracker {}", removed.label);
        self.changed(snapshot);
        Ok(removed)
    }

    /// Keep a freshly obtained session, but only if `account` is still the
    /// configuration registered under its label.
    ///
    /// Checked under the account-list lock that [`Self::add`] and
    /// [`Self::remove`] hold while dropping sessions, so a login started for
    /// a replaced or removed account can never be stored after the change.
    pub fn store_session(&self, account: &AccountConfig, session: SessionCredential) -> bool {
        let dynamic = self.inner.dynamic.read();
        let current = self
            .inner
            .static_accounts
            .iter()
            .chain(dynamic.iter())
            .any(|a| a == account);
        if current {
            self.inner.sessions.store(&account.label, session);
        } else {
            tracing::debug!("Discarding session for {}: account changed during login", account.label);
        }
        current
    }

    fn changed(&self, dynamic: Vec<AccountConfig>) {
        self.inner.revision.send_modify(|rev| *rev += 1);
        if let Some(queue) = &self.inner.persistence {
            queue.enqueue(dynamic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AccountRegistry {
        AccountRegistry::new(
            vec![AccountConfig::new("a", "pa", "A"), AccountConfig::new("", "", "B")],
            vec![AccountConfig::new("861", "pw", "Truck-1")],
        )
    }

    #[test]
    fn test_snapshot_order() {
        let labels: Vec<String> = registry().snapshot().into_iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["A", "B", "Truck-1"]);
    }

    #[test]
    fn test_add_trims_and_appends() {
        let registry = registry();
        let added = registry.add(AccountConfig::new(" 862 ", " pw ", " Van ")).unwrap();
        assert_eq!(added.label, "Van");
        assert_eq!(registry.find("Van").unwrap().account_id, "862");
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_add_rejects_blank_and_reserved() {
        let registry = registry();
        assert_eq!(
            registry.add(AccountConfig::new("1", "", "X")).unwrap_err(),
            AccountError::blank("password")
        );
        assert_eq!(
            registry.add(AccountConfig::new("1", "2", "A")).unwrap_err(),
            AccountError::ReservedLabel { label: "A".to_string() }
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_add_same_label_replaces_and_resets_session() {
        let registry = registry();
        registry.sessions().store("Truck-1", SessionCredential::new("old", "1"));

        registry.add(AccountConfig::new("999", "new", "Truck-1").with_color("#00ff00")).unwrap();

        let dynamic = registry.dynamic_accounts();
        assert_eq!(dynamic.len(), 1);
        assert_eq!(dynamic[0].account_id, "999");
        assert_eq!(dynamic[0].color.as_deref(), Some("#00ff00"));
        assert!(registry.sessions().get("Truck-1").is_none());
    }

    #[test]
    fn test_remove_drops_session() {
        let registry = registry();
        registry.sessions().store("Truck-1", SessionCredential::new("t", "1"));

        let removed = registry.remove("Truck-1").unwrap();
        assert_eq!(removed.account_id, "861");
        assert!(!registry.contains("Truck-1"));
        assert!(registry.sessions().is_empty());

        assert_eq!(
            registry.remove("Truck-1").unwrap_err(),
            AccountError::NotFound { label: "Truck-1".to_string() }
        );
        assert!(matches!(registry.remove("B"), Err(AccountError::ReservedLabel { .. })));
    }

    #[test]
    fn test_store_session_only_for_current_config() {
        let registry = registry();
        let original = registry.find("Truck-1").unwrap();

        assert!(registry.store_session(&original, SessionCredential::new("t1", "1")));
        assert!(registry.sessions().contains("Truck-1"));

        registry.add(AccountConfig::new("999", "new", "Truck-1")).unwrap();
        assert!(!registry.store_session(&original, SessionCredential::new("t2", "1")));
        assert!(registry.sessions().get("Truck-1").is_none());

        registry.remove("Truck-1").unwrap();
        let replaced = AccountConfig::new("999", "new", "Truck-1");
        assert!(!registry.store_session(&replaced, SessionCredential::new("t3", "1")));
        assert!(registry.sessions().is_empty());
    }

    #[test]
    fn test_mutations_bump_revision() {
        let registry = registry();
        let changes = registry.subscribe_changes();
        assert_eq!(*changes.borrow(), 0);

        registry.add(AccountConfig::new("1", "2", "Van")).unwrap();
        registry.remove("Van").unwrap();
        assert_eq!(*changes.borrow(), 2);
    }

    #[test]
    fn test_stored_reserved_labels_ignored() {
        let registry = AccountRegistry::new(
            vec![AccountConfig::new("a", "b", "A")],
            vec![AccountConfig::new("x", "y", "A"), AccountConfig::new("x", "y", "C")],
        );
        assert_eq!(registry.dynamic_accounts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changes_reach_store() {
        use crate::modules::persistence::{AccountStore, JsonFileStore};
        use std::time::Duration;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path()));
        let (queue, task) = PersistenceQueue::spawn(store.clone(), Duration::from_millis(600));
        let registry = AccountRegistry::with_persistence(Vec::new(), Vec::new(), queue);

        registry.add(AccountConfig::new("1", "p", "Van")).unwrap();
        registry.add(AccountConfig::new("2", "p", "Truck")).unwrap();
        registry.remove("Van").unwrap();
        drop(registry);
        task.await.unwrap();

        let stored = store.load_accounts().await.unwrap();
        assert_eq!(stored, vec![AccountConfig::new("2", "p", "Truck")]);
    }
}
