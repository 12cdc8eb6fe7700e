//! TOML-based application configuration.
//!
//! Stores:
//! - Remote status store endpoint and request timeout
//! - Poller cadence (fast refresh, slow reconcile)
//! - Fallback meal schedule used until the store answers
//! - Identity of the acting member
//!
//! Configuration is stored at `~/.config/mealy/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::period::ScheduleConfig;
use crate::poller::PollerConfig;

/// Remote status store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Timer cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerSection {
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_secs: u64,
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
}

/// Schedule used before the first successful schedule fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSection {
    #[serde(default = "default_lunch_start")]
    pub lunch_start_hour: u32,
    #[serde(default = "default_dinner_start")]
    pub dinner_start_hour: u32,
}

/// Who this client acts as.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    /// Auth uid of the acting member; matched against `Member::auth_uid`.
    #[serde(default)]
    pub member_uid: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/mealy/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub poller: PollerSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub session: SessionSection,
}

// Default functions
fn default_base_url() -> String {
    "https://mealyby-ayush.vercel.app".into()
}
fn default_request_timeout() -> u64 {
    10
}
fn default_fetch_interval() -> u64 {
    30
}
fn default_reconcile_interval() -> u64 {
    60
}
fn default_lunch_start() -> u32 {
    12
}
fn default_dinner_start() -> u32 {
    21
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for PollerSection {
    fn default() -> Self {
        Self {
            fetch_interval_secs: default_fetch_interval(),
            reconcile_interval_secs: default_reconcile_interval(),
        }
    }
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            lunch_start_hour: default_lunch_start(),
            dinner_start_hour: default_dinner_start(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("not a leaf key".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or create and persist the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value in memory by dot-separated key, then validate.
    /// Callers persist with [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fallback_schedule()
            .map_err(|e| ConfigError::InvalidValue {
                key: "schedule".into(),
                message: e.to_string(),
            })?;
        if self.poller.fetch_interval_secs == 0 || self.poller.reconcile_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poller".into(),
                message: "intervals must be at least one second".into(),
            });
        }
        if self.remote.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "remote.request_timeout_secs".into(),
                message: "timeout must be at least one second".into(),
            });
        }
        url::Url::parse(&self.remote.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "remote.base_url".into(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn fallback_schedule(&self) -> Result<ScheduleConfig, ValidationError> {
        ScheduleConfig::new(self.schedule.lunch_start_hour, self.schedule.dinner_start_hour)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            fetch_interval: Duration::from_secs(self.poller.fetch_interval_secs),
            reconcile_interval: Duration::from_secs(self.poller.reconcile_interval_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.request_timeout_secs)
    }

    /// Acting member uid, `None` when unset.
    pub fn member_uid(&self) -> Option<&str> {
        Some(self.session.member_uid.as_str()).filter(|uid| !uid.is_empty())
    }
}
