//! Application configuration: server, storage, logging, automation

use ads_automation::time_range;
use ads_core::AutomationSettings;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::loader::load_yaml;

/// Configuration file name inside the config directory
pub const CONFIG_FILE: &str = "budget_autopilot.yaml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8130,
        }
    }
}

impl ServerConfig {
    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the dataset and history live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `.storage/`; relative to the config directory
    pub root: PathBuf,
    /// History log file name, inside `.storage/`
    pub history_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            history_file: "history.jsonl".to_string(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Everything read from `budget_autopilot.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub automation: AutomationSettings,
}

impl AppConfig {
    /// Load from `config_dir`; a missing file yields the defaults
    ///
    /// A relative storage root is resolved against `config_dir`.
    pub fn load(config_dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let config_dir = config_dir.as_ref();
        let path = config_dir.join(CONFIG_FILE);

        let mut config = if path.is_file() {
            Self::from_yaml(&load_yaml(config_dir, CONFIG_FILE)?)?
        } else {
            info!(path = %path.display(), "No configuration file, using defaults");
            Self::default()
        };

        if config.storage.root.is_relative() {
            config.storage.root = config_dir.join(&config.storage.root);
        }
        debug!(storage = %config.storage.root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse and validate a loaded YAML document
    pub fn from_yaml(yaml: &Value) -> ConfigResult<Self> {
        let config: AppConfig = match yaml {
            Value::Null => AppConfig::default(),
            Value::Mapping(_) => serde_yaml::from_value(yaml.clone())
                .map_err(|e| ConfigError::invalid("root", e.to_string()))?,
            _ => return Err(ConfigError::invalid("root", "configuration must be a mapping")),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::invalid("server.host", "must not be empty"));
        }
        if self.storage.history_file.trim().is_empty() {
            return Err(ConfigError::invalid("storage.history_file", "must not be empty"));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }

        let automation = &self.automation;
        if !automation.min_budget_change.is_finite() || automation.min_budget_change < 0.0 {
            return Err(ConfigError::invalid(
                "automation.min_budget_change",
                "must be a non-negative number",
            ));
        }
        if !time_range::LABELS.contains(&automation.default_time_range.as_str()) {
            return Err(ConfigError::invalid(
                "automation.default_time_range",
                format!("unknown time range: {}", automation.default_time_range),
            ));
        }
        if automation.credential_kind.trim().is_empty() {
            return Err(ConfigError::invalid("automation.credential_kind", "must not be empty"));
        }
        Ok(())
    }

    /// Path of the history log
    pub fn history_path(&self) -> PathBuf {
        self.storage
            .root
            .join(".storage")
            .join(&self.storage.history_file)
    }
}
