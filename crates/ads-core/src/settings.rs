//! Tunables of the automation loop

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_MIN_BUDGET_CHANGE, DEFAULT_MIN_RESULTS, DEFAULT_TIME_RANGE};

/// Settings for the automation loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationSettings {
    /// Snapshots with fewer results fail validation
    #[serde(default = "default_min_results")]
    pub min_results: u64,

    /// Budget deltas below this are skipped
    #[serde(default = "default_min_budget_change")]
    pub min_budget_change: f64,

    /// Time range label used when no condition names one
    #[serde(default = "default_time_range")]
    pub default_time_range: String,

    /// Read budgets but only log changes
    #[serde(default)]
    pub dry_run: bool,

    /// Credential family looked up for providers
    #[serde(default = "default_credential_kind")]
    pub credential_kind: String,
}

fn default_min_results() -> u64 {
    DEFAULT_MIN_RESULTS
}

fn default_min_budget_change() -> f64 {
    DEFAULT_MIN_BUDGET_CHANGE
}

fn default_time_range() -> String {
    DEFAULT_TIME_RANGE.to_string()
}

fn default_credential_kind() -> String {
    "ad_platform".to_string()
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            min_results: default_min_results(),
            min_budget_change: default_min_budget_change(),
            default_time_range: default_time_range(),
            dry_run: false,
            credential_kind: default_credential_kind(),
        }
    }
}
