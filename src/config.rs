//! Configuration for health-sync.

use crate::backend::BackendConfig;
use crate::provider::Platform;
use crate::sync::{SyncConfig, DEFAULT_REFRESH_INTERVAL, DEFAULT_WORKOUT_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Period of the recurring fetch
    #[serde(with = "duration_serde")]
    pub refresh_interval: Duration,

    /// Upper bound on workouts per fetch
    pub workout_limit: usize,

    /// Platform override; detected from the build target when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Path for storing state and transparency logs
    pub data_path: PathBuf,

    /// Path for exported persistence rows
    pub export_path: PathBuf,

    /// Backend upload settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("health-sync");

        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            workout_limit: DEFAULT_WORKOUT_LIMIT,
            platform: None,
            export_path: data_dir.join("exports"),
            data_path: data_dir,
            backend: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, falling back to defaults when it
    /// does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("health-sync")
            .join("config.json")
    }

    /// Path of the persisted transparency log.
    pub fn transparency_path(&self) -> PathBuf {
        self.data_path.join("transparency.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Reject settings the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "refresh_interval must be at least one second".to_string(),
            ));
        }
        if self.workout_limit == 0 {
            return Err(ConfigError::Invalid(
                "workout_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Controller settings derived from this configuration.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            refresh_interval: self.refresh_interval,
            workout_limit: self.workout_limit,
            platform: self.platform.unwrap_or_else(Platform::current),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
