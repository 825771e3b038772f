//! TOML-based monitor configuration.
//!
//! Stores:
//! - Polling cadence and the optional control-call timeout
//! - Schedule defaults for newly created schedules
//! - Pace thresholds (`[pace]` table)
//! - Where schedule files live
//!
//! Configuration is stored at `~/.config/slidepace/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::pace::PacePolicy;
use crate::schedule::ScheduleStore;

/// Monitor configuration.
///
/// Serialized to/from TOML at `~/.config/slidepace/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-call timeout on the presentation control, unset for none.
    #[serde(default)]
    pub control_timeout_ms: Option<u64>,
    #[serde(default = "default_slide_seconds")]
    pub default_slide_seconds: f64,
    #[serde(default = "default_transition_seconds")]
    pub transition_seconds: f64,
    /// Stopping the presentation also stops monitoring.
    #[serde(default = "default_true")]
    pub auto_stop_monitoring: bool,
    /// Directory for schedule files instead of next to the document.
    #[serde(default)]
    pub schedule_dir: Option<PathBuf>,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default)]
    pub pace: PacePolicy,
}

// Default functions
fn default_poll_interval_ms() -> u64 {
    2000
}
fn default_slide_seconds() -> f64 {
    crate::schedule::DEFAULT_SLIDE_SECONDS
}
fn default_transition_seconds() -> f64 {
    crate::schedule::DEFAULT_TRANSITION_SECONDS
}
fn default_true() -> bool {
    true
}
fn default_event_capacity() -> usize {
    256
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            control_timeout_ms: None,
            default_slide_seconds: default_slide_seconds(),
            transition_seconds: default_transition_seconds(),
            auto_stop_monitoring: true,
            schedule_dir: None,
            event_capacity: default_event_capacity(),
            pace: PacePolicy::default(),
        }
    }
}

impl MonitorConfig {
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
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                // Unset optional fields are omitted from the serialized form.
                let existing = obj.get(part).cloned().unwrap_or(serde_json::Value::Null);
                if existing.is_null() && !Self::OPTIONAL_KEYS.contains(&key) {
                    return Err(unknown());
                }

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => parse_number(value)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Null => match value {
                        "" | "none" => serde_json::Value::Null,
                        other => parse_number(other)
                            .unwrap_or_else(|| serde_json::Value::String(other.into())),
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    const OPTIONAL_KEYS: &'static [&'static str] = &["control_timeout_ms", "schedule_dir"];

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or is
    /// invalid, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: MonitorConfig =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!(%err, "using default configuration");
            Self::default()
        })
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
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config is invalid. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: MonitorConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        if self.poll_interval_ms == 0 {
            return invalid("poll_interval_ms", "must be greater than zero");
        }
        if !(self.default_slide_seconds.is_finite() && self.default_slide_seconds >= 0.0) {
            return invalid("default_slide_seconds", "must be a non-negative number");
        }
        if self.event_capacity == 0 {
            return invalid("event_capacity", "must be greater than zero");
        }
        if !(self.pace.warning_ratio > 0.0 && self.pace.warning_ratio <= 1.0) {
            return invalid("pace.warning_ratio", "must be in (0, 1]");
        }
        if self.pace.losing_progress_secs < 0.0
            || self.pace.losing_progress_secs > self.pace.off_track_secs
        {
            return invalid(
                "pace.losing_progress_secs",
                "must be non-negative and not above pace.off_track_secs",
            );
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn control_timeout(&self) -> Option<Duration> {
        self.control_timeout_ms.map(Duration::from_millis)
    }

    pub fn schedule_store(&self) -> ScheduleStore {
        ScheduleStore::new(
            self.schedule_dir.clone(),
            self.default_slide_seconds,
            self.transition_seconds,
        )
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}
