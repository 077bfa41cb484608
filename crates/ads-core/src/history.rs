//! Audit trail of rule evaluations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::metrics::{MetricsSnapshot, TimeRange};
use crate::rule::{ActionType, CombinationMode, Rule};

/// What triggered a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionSource {
    /// Scheduled job
    #[default]
    Cron,
    /// Operator-triggered from the command line
    Manual,
    /// HTTP "execute now" request
    Api,
}

/// Outcome of executing one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub action_type: ActionType,
    /// Budget before the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<f64>,
    /// Budget after the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<f64>,
    /// Whether the provider was asked to change anything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the provider only logged the change
    #[serde(default)]
    pub dry_run: bool,
}

impl ActionResult {
    /// A failed action
    pub fn failed(action_type: ActionType, error: impl Into<String>) -> Self {
        Self {
            success: false,
            action_type,
            before: None,
            after: None,
            changed: None,
            error: Some(error.into()),
            dry_run: false,
        }
    }

    /// A budget change that was applied
    pub fn changed(action_type: ActionType, before: f64, after: f64) -> Self {
        Self {
            success: true,
            action_type,
            before: Some(before),
            after: Some(after),
            changed: Some(true),
            error: None,
            dry_run: false,
        }
    }

    /// A budget change skipped because the delta was too small
    pub fn unchanged(action_type: ActionType, current: f64) -> Self {
        Self {
            success: true,
            action_type,
            before: Some(current),
            after: Some(current),
            changed: Some(false),
            error: None,
            dry_run: false,
        }
    }

    /// A successful pause
    pub fn paused() -> Self {
        Self {
            success: true,
            action_type: ActionType::Pause,
            before: None,
            after: None,
            changed: Some(true),
            error: None,
            dry_run: false,
        }
    }

    /// Mark the result as produced by a dry-run provider
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// One rule evaluation, written exactly once whatever the outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Record id (ULID)
    pub id: String,
    pub rule_id: String,
    pub owner_id: String,
    pub asset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_snapshot: Option<MetricsSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    pub conditions_met: bool,
    pub combination_mode: CombinationMode,
    pub action_executed: bool,
    /// First action's type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    /// First action's result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_result: Option<ActionResult>,
    /// Every action's result, in configuration order
    #[serde(default)]
    pub action_results: Vec<ActionResult>,
    pub execution_source: ExecutionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Start a record for `rule` with nothing evaluated yet
    pub fn new(rule: &Rule, source: ExecutionSource) -> Self {
        Self {
            id: Ulid::new().to_string(),
            rule_id: rule.id.clone(),
            owner_id: rule.owner_id.clone(),
            asset_id: rule.asset_id.clone(),
            metrics_snapshot: None,
            time_range: None,
            conditions_met: false,
            combination_mode: rule.config.combination_mode.clone(),
            action_executed: false,
            action_type: None,
            action_result: None,
            action_results: Vec::new(),
            execution_source: source,
            error_message: None,
            executed_at: Utc::now(),
        }
    }

    /// Attach the metrics the decision was based on
    pub fn set_metrics(&mut self, snapshot: MetricsSnapshot, time_range: TimeRange) {
        self.metrics_snapshot = Some(snapshot);
        self.time_range = Some(time_range);
    }

    /// Attach a failure message
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Record matched conditions and the actions they triggered
    ///
    /// The first result becomes the summary; `action_executed` is set when
    /// any action succeeded.
    pub fn set_actions(&mut self, results: Vec<ActionResult>) {
        self.conditions_met = true;
        self.action_executed = results.iter().any(|r| r.success);
        self.action_type = results.first().map(|r| r.action_type.clone());
        self.action_result = results.first().cloned();
        self.action_results = results;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{RuleConfig, RuleStatus};

    fn rule() -> Rule {
        Rule {
            id: "r1".into(),
            name: "Test".into(),
            status: RuleStatus::Active,
            asset_id: "a1".into(),
            owner_id: "u1".into(),
            config: RuleConfig {
                condition_groups: vec![],
                combination_mode: CombinationMode::OrAndOr,
                actions: vec![],
            },
        }
    }

    #[test]
    fn test_new_record_is_unmatched() {
        let record = HistoryRecord::new(&rule(), ExecutionSource::Api);
        assert_eq!(record.rule_id, "r1");
        assert_eq!(record.asset_id, "a1");
        assert_eq!(record.combination_mode, CombinationMode::OrAndOr);
        assert!(!record.conditions_met);
        assert!(!record.action_executed);
        assert!(record.id.parse::<Ulid>().is_ok());
    }

    #[test]
    fn test_first_action_is_summary() {
        let mut record = HistoryRecord::new(&rule(), ExecutionSource::Cron);
        record.set_actions(vec![
            ActionResult::failed(ActionType::IncreaseBudget, "provider down"),
            ActionResult::paused(),
        ]);

        assert!(record.conditions_met);
        assert!(record.action_executed);
        assert_eq!(record.action_type, Some(ActionType::IncreaseBudget));
        assert_eq!(
            record.action_result.as_ref().and_then(|r| r.error.as_deref()),
            Some("provider down")
        );
        assert_eq!(record.action_results.len(), 2);
    }

    #[test]
    fn test_serialized_shape() {
        let mut record = HistoryRecord::new(&rule(), ExecutionSource::Manual);
        record.set_error("no data in range");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["execution_source"], "manual");
        assert_eq!(value["combination_mode"], "or_and_or");
        assert_eq!(value["error_message"], "no data in range");
        assert!(value.get("metrics_snapshot").is_none());
    }
}
