//! Configuration loading for budget automation
//!
//! `budget_autopilot.yaml` is read from the config directory with these
//! YAML tags resolved:
//!
//! - `!include path` - Include another YAML file, relative to the including file
//! - `!secret key` - Substitute from `secrets.yaml` next to the config
//! - `!env_var VAR [default]` - Environment variable substitution
//!
//! # Example
//!
//! ```ignore
//! use ads_config::AppConfig;
//!
//! let config = AppConfig::load("/etc/budget-autopilot")?;
//! println!("listening on {}", config.server.address());
//! ```

mod app_config;
mod error;
mod loader;
mod secrets;

pub use app_config::{AppConfig, LoggingConfig, ServerConfig, StorageConfig, CONFIG_FILE};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, YamlLoader};
pub use secrets::Secrets;

pub use serde_yaml::Value;
