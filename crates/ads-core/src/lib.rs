//! Core types for budget automation
//!
//! This crate provides the domain types shared by the automation workspace:
//! rules and their conditions/actions, bound assets and credentials, metric
//! snapshots, history records and run reports.

mod asset;
mod history;
mod metrics;
mod report;
mod rule;
mod settings;

pub use asset::{Asset, AssetType, Credential};
pub use history::{ActionResult, ExecutionSource, HistoryRecord};
pub use metrics::{MetricsSnapshot, RawCounters, TimeRange};
pub use report::{OutcomeStatus, RuleOutcome, RunReport};
pub use rule::{
    ActionType, BudgetAction, ChangeType, CombinationMode, ConditionGroup, MetricCondition, Rule,
    RuleConfig, RuleStatus,
};
pub use settings::AutomationSettings;

/// Time range label used when no condition names one
pub const DEFAULT_TIME_RANGE: &str = "today";

/// Minimum number of results before a snapshot is trusted
pub const DEFAULT_MIN_RESULTS: u64 = 2;

/// Budget deltas smaller than this are skipped
pub const DEFAULT_MIN_BUDGET_CHANGE: f64 = 0.01;
