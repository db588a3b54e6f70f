//! Storage of user-added tracker accounts.
//!
//! Saves are debounced: bursts of registry changes coalesce into one write
//! of the latest list. A failed write is logged and never reaches polling.

use async_trait::async_trait;
use fleetsync_types::{AccountConfig, ConfigError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const TRACKERS_FILE: &str = "trackers.json";

/// Persistent home of the dynamic account list.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn load_accounts(&self) -> Result<Vec<AccountConfig>, ConfigError>;

    /// Store the full dynamic list, replacing what was there.
    async fn save_accounts(&self, accounts: &[AccountConfig]) -> Result<(), ConfigError>;
}

/// `trackers.json` in the data directory: a JSON array of
/// `{imei, password, label, color?}` records.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self { path: data_dir.join(TRACKERS_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn load_accounts(&self) -> Result<Vec<AccountConfig>, ConfigError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ConfigError::ReadError {
                    message: format!("{}: {}", self.path.display(), e),
                })
            },
        };

        let records: Vec<AccountConfig> =
            serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))?;

        // Hand-edited files may repeat a label; the last record wins.
        let mut accounts: Vec<AccountConfig> = Vec::with_capacity(records.len());
        for record in records {
            match record.validated() {
                Ok(account) => {
                    accounts.retain(|a| a.label != account.label);
                    accounts.push(account);
                },
                Err(e) => tracing::warn!("Skipping stored tracker: {}", e),
            }
        }

        tracing::debug!("Loaded {} tracker(s) from {}", accounts.len(), self.path.display());
        Ok(accounts)
    }

    async fn save_accounts(&self, accounts: &[AccountConfig]) -> Result<(), ConfigError> {
        let temp_path = self.path.with_extension("json.tmp");
        let content =
            serde_json::to_string_pretty(accounts).map_err(|e| ConfigError::from_json_error(&e))?;

        // Atomic write
        tokio::fs::write(&temp_path, content).await.map_err(|e| ConfigError::from_io_error(&e))?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| ConfigError::from_io_error(&e))
    }
}

/// Debounced writer in front of an [`AccountStore`].
///
/// Dropping every clone flushes the pending list and ends the task.
#[derive(Clone)]
pub struct PersistenceQueue {
    tx: mpsc::UnboundedSender<Vec<AccountConfig>>,
}

impl PersistenceQueue {
    pub fn spawn(store: Arc<dyn AccountStore>, quiet_period: Duration) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_writer(store, rx, quiet_period));
        (Self { tx }, task)
    }

    pub fn enqueue(&self, accounts: Vec<AccountConfig>) {
        if self.tx.send(accounts).is_err() {
            tracing::error!("Tracker writer has stopped; change not persisted");
        }
    }
}

async fn run_writer(
    store: Arc<dyn AccountStore>,
    mut rx: mpsc::UnboundedReceiver<Vec<AccountConfig>>,
    quiet_period: Duration,
) {
    while let Some(mut latest) = rx.recv().await {
        let mut closed = false;
        loop {
            match tokio::time::timeout(quiet_period, rx.recv()).await {
                Ok(Some(newer)) => latest = newer,
                Ok(None) => {
                    closed = true;
                    break;
                },
                Err(_) => break,
            }
        }

        match store.save_accounts(&latest).await {
            Ok(()) => tracing::debug!("Persisted {} tracker(s)", latest.len()),
            Err(e) => tracing::error!("Failed to persist trackers: {}", e),
        }

        if closed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        saves: Mutex<Vec<Vec<AccountConfig>>>,
    }

    #[async_trait]
    impl AccountStore for RecordingStore {
        async fn load_accounts(&self) -> Result<Vec<AccountConfig>, ConfigError> {
            Ok(self.saves.lock().last().cloned().unwrap_or_default())
        }

        async fn save_accounts(&self, accounts: &[AccountConfig]) -> Result<(), ConfigError> {
            self.saves.lock().push(accounts.to_vec());
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl AccountStore for FailingStore {
        async fn load_accounts(&self) -> Result<Vec<AccountConfig>, ConfigError> {
            Ok(Vec::new())
        }

        async fn save_accounts(&self, _: &[AccountConfig]) -> Result<(), ConfigError> {
            Err(ConfigError::WriteError { message: "disk full".to_string() })
        }
    }

    fn account(label: &str) -> AccountConfig {
        AccountConfig::new("8612", "pw", label)
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load_accounts().await.unwrap().is_empty());

        let accounts = vec![account("Truck-1").with_color("#ff0000"), account("Van")];
        store.save_accounts(&accounts).await.unwrap();

        assert_eq!(store.load_accounts().await.unwrap(), accounts);
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"imei\": \"8612\""));
    }

    #[tokio::test]
    async fn test_file_store_last_label_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TRACKERS_FILE),
            r#"[
                {"imei": "1", "password": "p", "label": "Truck"},
                {"imei": "", "password": "p", "label": "Broken"},
                {"imei": "2", "password": "p", "label": "Truck"}
            ]"#,
        )
        .unwrap();

        let accounts = JsonFileStore::new(dir.path()).load_accounts().await.unwrap();
        assert_eq!(accounts, vec![AccountConfig::new("2", "p", "Truck")]);
    }

    #[tokio::test]
    async fn test_file_store_malformed_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TRACKERS_FILE), "[{").unwrap();
        let err = JsonFileStore::new(dir.path()).load_accounts().await.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_coalesces_burst() {
        let store = Arc::new(RecordingStore::default());
        let (queue, _task) = PersistenceQueue::spawn(store.clone(), Duration::from_millis(600));

        queue.enqueue(vec![account("a")]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        queue.enqueue(vec![account("a"), account("b")]);
        queue.enqueue(vec![account("b")]);
        assert!(store.saves.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(700)).await;
        let saves = store.saves.lock().clone();
        assert_eq!(saves, vec![vec![account("b")]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_flushes_on_drop() {
        let store = Arc::new(RecordingStore::default());
        let (queue, task) = PersistenceQueue::spawn(store.clone(), Duration::from_secs(60));

        queue.enqueue(vec![account("x")]);
        drop(queue);
        task.await.unwrap();

        assert_eq!(store.saves.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_survives_write_failure() {
        let (queue, task) = PersistenceQueue::spawn(Arc::new(FailingStore), Duration::from_millis(10));
        queue.enqueue(vec![account("x")]);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());

        queue.enqueue(vec![account("y")]);
        drop(queue);
        task.await.unwrap();
    }
}
