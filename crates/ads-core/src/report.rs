//! Run summaries returned to the caller

use serde::{Deserialize, Serialize};

use crate::history::ActionResult;

/// Whether a rule got as far as a boolean decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Conditions evaluated, matched or not
    Evaluated,
    /// Evaluation failed before a decision
    Failed,
}

/// Per-rule entry of a run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub rule_name: String,
    pub asset_id: String,
    pub status: OutcomeStatus,
    pub conditions_met: bool,
    #[serde(default)]
    pub actions: Vec<ActionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Id of the history record written for this evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,
}

/// Summary of one batch invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// False only when the batch could not start
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub rules_processed: usize,
    pub actions_executed: usize,
    pub errors: usize,
    #[serde(default)]
    pub results: Vec<RuleOutcome>,
    pub execution_time_seconds: f64,
}

impl RunReport {
    /// A successful report with nothing counted yet
    pub fn empty() -> Self {
        Self {
            success: true,
            message: None,
            rules_processed: 0,
            actions_executed: 0,
            errors: 0,
            results: Vec::new(),
            execution_time_seconds: 0.0,
        }
    }

    /// A report for a batch that could not start
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
