//! Automation rules: condition groups plus budget actions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Rule lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Active,
    Inactive,
}

/// A user-owned automation policy bound to one ad asset
///
/// Rules are created and edited elsewhere; the automation loop only reads
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub status: RuleStatus,
    /// Asset the rule acts on
    pub asset_id: String,
    pub owner_id: String,
    pub config: RuleConfig,
}

impl Rule {
    /// Check if the rule should be picked up by the loop
    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    /// Iterate over every condition of every group, in order
    pub fn conditions(&self) -> impl Iterator<Item = &MetricCondition> {
        self.config
            .condition_groups
            .iter()
            .flat_map(|group| group.conditions.iter())
    }
}

/// Conditions, how to combine them, and what to do on a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub condition_groups: Vec<ConditionGroup>,
    #[serde(default)]
    pub combination_mode: CombinationMode,
    #[serde(default)]
    pub actions: Vec<BudgetAction>,
}

/// Comparisons evaluated together
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionGroup {
    #[serde(default)]
    pub conditions: Vec<MetricCondition>,
}

impl ConditionGroup {
    pub fn new(conditions: Vec<MetricCondition>) -> Self {
        Self { conditions }
    }
}

/// One comparison against a snapshot metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCondition {
    /// Snapshot field name, e.g. `ctr` or `cost_per_result`
    pub metric: String,
    /// Evaluator operator name, e.g. `>=`
    pub operator: String,
    /// Threshold; numbers and numeric strings are accepted
    pub value: Value,
    /// Time range label, e.g. `last_7d`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
}

impl MetricCondition {
    pub fn new(metric: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            metric: metric.into(),
            operator: operator.into(),
            value: value.into(),
            time_range: None,
        }
    }

    /// Set the time range label
    pub fn over(mut self, time_range: impl Into<String>) -> Self {
        self.time_range = Some(time_range.into());
        self
    }
}

/// Strategy for merging condition groups into one boolean
///
/// Unknown modes survive deserialization so that a single misconfigured rule
/// fails on its own instead of breaking the whole rule list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CombinationMode {
    /// AND within a group, OR across groups
    #[default]
    AndOrAnd,
    /// OR within a group, AND across groups
    OrAndOr,
    Unknown(String),
}

impl CombinationMode {
    pub fn as_str(&self) -> &str {
        match self {
            CombinationMode::AndOrAnd => "and_or_and",
            CombinationMode::OrAndOr => "or_and_or",
            CombinationMode::Unknown(other) => other,
        }
    }
}

impl From<String> for CombinationMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "and_or_and" => CombinationMode::AndOrAnd,
            "or_and_or" => CombinationMode::OrAndOr,
            _ => CombinationMode::Unknown(value),
        }
    }
}

impl From<CombinationMode> for String {
    fn from(mode: CombinationMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for CombinationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of change an action applies
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    IncreaseBudget,
    DecreaseBudget,
    Pause,
    /// Anything else; executes as a failed "unsupported action"
    Unsupported(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::IncreaseBudget => "increaseBudget",
            ActionType::DecreaseBudget => "decreaseBudget",
            ActionType::Pause => "pause",
            ActionType::Unsupported(other) => other,
        }
    }
}

impl From<String> for ActionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "increaseBudget" => ActionType::IncreaseBudget,
            "decreaseBudget" => ActionType::DecreaseBudget,
            "pause" => ActionType::Pause,
            _ => ActionType::Unsupported(value),
        }
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `change_by` is interpreted
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeType {
    Percent,
    #[default]
    Absolute,
    /// Anything else; a budget action with it fails as "unsupported change type"
    Unsupported(String),
}

impl ChangeType {
    pub fn as_str(&self) -> &str {
        match self {
            ChangeType::Percent => "percent",
            ChangeType::Absolute => "absolute",
            ChangeType::Unsupported(other) => other,
        }
    }
}

impl From<String> for ChangeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "percent" => ChangeType::Percent,
            "absolute" => ChangeType::Absolute,
            _ => ChangeType::Unsupported(value),
        }
    }
}

impl From<ChangeType> for String {
    fn from(change: ChangeType) -> Self {
        change.as_str().to_string()
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change to apply when a rule's conditions match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAction {
    #[serde(alias = "action_type")]
    pub action_type: ActionType,
    #[serde(default, alias = "change_by")]
    pub change_by: f64,
    #[serde(default, alias = "change_type")]
    pub change_type: ChangeType,
    /// Ceiling for increases, floor for decreases
    #[serde(default, alias = "until_limit", skip_serializing_if = "Option::is_none")]
    pub until_limit: Option<f64>,
    /// Platform budget kind, e.g. `daily` or `lifetime`
    #[serde(default, alias = "budget_type", skip_serializing_if = "Option::is_none")]
    pub budget_type: Option<String>,
}

impl BudgetAction {
    /// Increase by `percent` percent, capped at `limit`
    pub fn increase_percent(percent: f64, limit: Option<f64>) -> Self {
        Self {
            action_type: ActionType::IncreaseBudget,
            change_by: percent,
            change_type: ChangeType::Percent,
            until_limit: limit,
            budget_type: None,
        }
    }

    /// Decrease by `percent` percent, floored at `limit`
    pub fn decrease_percent(percent: f64, limit: Option<f64>) -> Self {
        Self {
            action_type: ActionType::DecreaseBudget,
            change_by: percent,
            change_type: ChangeType::Percent,
            until_limit: limit,
            budget_type: None,
        }
    }

    /// Pause the asset
    pub fn pause() -> Self {
        Self {
            action_type: ActionType::Pause,
            change_by: 0.0,
            change_type: ChangeType::Absolute,
            until_limit: None,
            budget_type: None,
        }
    }
}
