//! Application configuration: `<data_dir>/fleetsync.json` plus environment
//! overrides for the two static accounts and the timing knobs.

use fleetsync_types::{AccountConfig, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::map::MotionConfig;
use crate::sync::PollingConfig;

pub const CONFIG_FILE: &str = "fleetsync.json";
const DATA_DIR: &str = "fleetsync";

/// Labels of the two compile-time accounts.
pub const STATIC_LABELS: [&str; 2] = ["A", "B"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticCredentials {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FleetConfig {
    pub account_a: StaticCredentials,
    pub account_b: StaticCredentials,
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub animation_ms: u64,
    pub frame_interval_ms: u64,
    pub persist_debounce_ms: u64,
    pub geocode_url: String,
    pub geocode_ttl_secs: u64,
    pub geocode_language: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            account_a: StaticCredentials::default(),
            account_b: StaticCredentials::default(),
            base_url: whatsgps_client::DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 15_000,
            request_timeout_ms: 10_000,
            animation_ms: 600,
            frame_interval_ms: 16,
            persist_debounce_ms: 600,
            geocode_url: "https://nominatim.openstreetmap.org".to_string(),
            geocode_ttl_secs: 30,
            geocode_language: "ru".to_string(),
        }
    }
}

impl FleetConfig {
    /// Static accounts `A` and `B`, in that order. Blank credentials are kept;
    /// the poller skips them.
    pub fn static_accounts(&self) -> Vec<AccountConfig> {
        [&self.account_a, &self.account_b]
            .into_iter()
            .zip(STATIC_LABELS)
            .map(|(creds, label)| {
                AccountConfig::new(creds.login.trim(), creds.password.trim(), label)
            })
            .collect()
    }

    pub fn polling(&self) -> PollingConfig {
        PollingConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            account_timeout: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn motion(&self) -> MotionConfig {
        MotionConfig {
            duration: Duration::from_millis(self.animation_ms),
            frame_interval: Duration::from_millis(self.frame_interval_ms),
        }
    }

    pub fn client(&self) -> whatsgps_client::ClientConfig {
        whatsgps_client::ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn geocode_ttl(&self) -> Duration {
        Duration::from_secs(self.geocode_ttl_secs)
    }

    /// Apply `FLEETSYNC_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparsable numbers are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let text = |key: &str, target: &mut String| {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        };
        text("FLEETSYNC_LOGIN_A", &mut self.account_a.login);
        text("FLEETSYNC_PASS_A", &mut self.account_a.password);
        text("FLEETSYNC_LOGIN_B", &mut self.account_b.login);
        text("FLEETSYNC_PASS_B", &mut self.account_b.password);
        text("FLEETSYNC_BASE_URL", &mut self.base_url);

        let number = |key: &str, target: &mut u64| {
            if let Some(value) = lookup(key) {
                match value.trim().parse() {
                    Ok(parsed) => *target = parsed,
                    Err(_) => tracing::warn!("Ignoring {}={:?}: not a number", key, value),
                }
            }
        };
        number("FLEETSYNC_POLL_INTERVAL_MS", &mut self.poll_interval_ms);
        number("FLEETSYNC_ANIMATION_MS", &mut self.animation_ms);
        number("FLEETSYNC_REQUEST_TIMEOUT_MS", &mut self.request_timeout_ms);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("base_url", &self.base_url), ("geocode_url", &self.geocode_url)] {
            url::Url::parse(value).map_err(|e| ConfigError::ValidationError {
                field: field.to_string(),
                message: format!("{value:?} is not a valid URL: {e}"),
            })?;
        }
        for (field, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("frame_interval_ms", self.frame_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Data directory: `$FLEETSYNC_DATA_DIR`, else `<platform data dir>/fleetsync`.
/// Created if missing.
pub fn get_data_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = match std::env::var_os("FLEETSYNC_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .ok_or_else(|| ConfigError::NoDataDir {
                message: "platform data directory is unknown".to_string(),
            })?
            .join(DATA_DIR),
    };

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir).map_err(|e| ConfigError::NoDataDir {
            message: format!("{}: {}", data_dir.display(), e),
        })?;
    }

    Ok(data_dir)
}

/// Load the config file from `data_dir`; defaults when the file does not exist.
pub fn load_config(data_dir: &Path) -> Result<FleetConfig, ConfigError> {
    let config_path = data_dir.join(CONFIG_FILE);

    if !config_path.exists() {
        return Ok(FleetConfig::default());
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        message: format!("{}: {}", config_path.display(), e),
    })?;

    serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))
}

pub fn save_config(data_dir: &Path, config: &FleetConfig) -> Result<(), ConfigError> {
    let config_path = data_dir.join(CONFIG_FILE);
    let temp_path = data_dir.join(format!("{CONFIG_FILE}.tmp"));

    let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::from_json_error(&e))?;

    // Atomic write
    std::fs::write(&temp_path, content).map_err(|e| ConfigError::from_io_error(&e))?;
    std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::from_io_error(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config, FleetConfig::default());
        assert_eq!(config.poll_interval_ms, 15_000);
        assert_eq!(config.animation_ms, 600);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"account_a": {"login": "8612", "password": "pw"}, "poll_interval_ms": 5000}"#,
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.request_timeout_ms, 10_000);

        let accounts = config.static_accounts();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0], AccountConfig::new("8612", "pw", "A"));
        assert!(!accounts[1].has_credentials());
        assert_eq!(accounts[1].label, "B");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FleetConfig::default();
        config.geocode_language = "en".to_string();

        save_config(dir.path(), &config).unwrap();
        assert!(!dir.path().join("fleetsync.json.tmp").exists());
        assert_eq!(load_config(dir.path()).unwrap().geocode_language, "en");
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();
        assert!(matches!(load_config(dir.path()), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FLEETSYNC_LOGIN_B", "b-login"),
            ("FLEETSYNC_PASS_B", "b-pass"),
            ("FLEETSYNC_POLL_INTERVAL_MS", "2500"),
            ("FLEETSYNC_ANIMATION_MS", "fast"),
        ]);
        let mut config = FleetConfig::default();
        config.apply_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.account_b.login, "b-login");
        assert_eq!(config.poll_interval_ms, 2500);
        assert_eq!(config.animation_ms, 600);
        assert_eq!(config.polling().interval, Duration::from_millis(2500));
    }

    #[test]
    fn test_validate() {
        assert!(FleetConfig::default().validate().is_ok());

        let config = FleetConfig { base_url: "nope".to_string(), ..FleetConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError { field, .. }) if field == "base_url"));

        let config = FleetConfig { poll_interval_ms: 0, ..FleetConfig::default() };
        assert!(config.validate().is_err());
    }
}
