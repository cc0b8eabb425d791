//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Completion feedback (sound, vibration, desktop notification)
//! - Default interval session parameters
//! - Polling cadence
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::completion::{CompletionSettings, SoundType, VibrationPattern};
use crate::error::{ConfigError, TimerError};
use crate::timer::IntervalPlan;

/// Completion feedback preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default)]
    pub sound_type: SoundType,
    #[serde(default = "default_50")]
    pub volume: u8,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    #[serde(default)]
    pub vibration_pattern: VibrationPattern,
    #[serde(default = "default_true")]
    pub notification_enabled: bool,
    /// Custom notification body. Empty means the generated message.
    #[serde(default)]
    pub notification_message: String,
}

/// Defaults used when `interval start` is given no explicit values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalDefaults {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: f64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: f64,
    /// 0 means run until stopped.
    #[serde(default)]
    pub loops: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerConfig {
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub interval: IntervalDefaults,
    #[serde(default)]
    pub ticker: TickerConfig,
}

fn default_true() -> bool {
    true
}
fn default_50() -> u8 {
    50
}
fn default_work_minutes() -> f64 {
    25.0
}
fn default_break_minutes() -> f64 {
    5.0
}
fn default_cadence_ms() -> u64 {
    100
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            sound_type: SoundType::default(),
            volume: default_50(),
            vibration_enabled: true,
            vibration_pattern: VibrationPattern::default(),
            notification_enabled: true,
            notification_message: String::new(),
        }
    }
}

impl Default for IntervalDefaults {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            loops: 0,
        }
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            cadence_ms: default_cadence_ms(),
        }
    }
}

impl From<&FeedbackConfig> for CompletionSettings {
    fn from(cfg: &FeedbackConfig) -> Self {
        Self {
            sound_enabled: cfg.sound_enabled,
            sound_type: cfg.sound_type,
            volume: cfg.volume.min(100),
            vibration_enabled: cfg.vibration_enabled,
            vibration_pattern: cfg.vibration_pattern,
            notification_enabled: cfg.notification_enabled,
            notification_message: Some(cfg.notification_message.trim())
                .filter(|m| !m.is_empty())
                .map(str::to_string),
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
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
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

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// See [`Config::save`].
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
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    pub fn completion_settings(&self) -> CompletionSettings {
        CompletionSettings::from(&self.feedback)
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.ticker.cadence_ms.max(10))
    }

    /// Build an interval plan, filling gaps from the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns the validation error for any out-of-range value.
    pub fn interval_plan(
        &self,
        work_minutes: Option<f64>,
        break_minutes: Option<f64>,
        loops: Option<i64>,
        name: Option<String>,
    ) -> Result<IntervalPlan, TimerError> {
        let default_loops = Some(i64::from(self.interval.loops)).filter(|&n| n > 0);
        IntervalPlan::from_minutes(
            work_minutes.unwrap_or(self.interval.work_minutes),
            break_minutes.unwrap_or(self.interval.break_minutes),
            loops.or(default_loops),
            name,
        )
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
