//! Loading a configuration directory from disk

use ads_config::{AppConfig, ConfigError, CONFIG_FILE};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_full_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("secrets.yaml"), "bind_host: 0.0.0.0\n").unwrap();
    fs::write(
        dir.path().join("automation.yaml"),
        "min_results: 3\nmin_budget_change: 0.5\ndefault_time_range: last_7d\n",
    )
    .unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE),
        r#"
server:
  host: !secret bind_host
  port: 8200
storage:
  root: data
logging:
  level: !env_var ADS_LOAD_TEST_LEVEL warn
  json: true
automation: !include automation.yaml
"#,
    )
    .unwrap();

    let config = AppConfig::load(dir.path()).unwrap();

    assert_eq!(config.server.address(), "0.0.0.0:8200");
    assert_eq!(config.storage.root, dir.path().join("data"));
    assert_eq!(
        config.history_path(),
        dir.path().join("data").join(".storage").join("history.jsonl")
    );
    assert_eq!(config.logging.level, "warn");
    assert!(config.logging.json);
    assert_eq!(config.automation.min_results, 3);
    assert_eq!(config.automation.min_budget_change, 0.5);
    assert_eq!(config.automation.default_time_range, "last_7d");
    assert!(!config.automation.dry_run);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();

    let config = AppConfig::load(dir.path()).unwrap();

    assert_eq!(config.server.port, 8130);
    assert_eq!(config.storage.root, dir.path().join("."));
}

#[test]
fn test_validation_error_surfaces() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE),
        "automation:\n  credential_kind: \"\"\n",
    )
    .unwrap();

    let err = AppConfig::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
    assert_eq!(
        err.to_string(),
        "invalid configuration value for 'automation.credential_kind': must not be empty"
    );
}
