//! Error types for the automation loop

use ads_core::{MetricsSnapshot, TimeRange};
use ads_logic::LogicError;
use ads_providers::ProviderError;
use ads_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Condition compilation errors; all are rule configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("rule has no condition groups")]
    NoGroups,

    #[error("condition group {index} is empty")]
    EmptyGroup { index: usize },

    #[error("unknown combination mode: {0}")]
    UnknownMode(String),

    #[error("threshold for {metric} is not numeric: {value}")]
    NonNumericThreshold { metric: String, value: String },

    #[error(transparent)]
    Operator(#[from] LogicError),
}

/// Result type for condition compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Why a snapshot was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Spend, results and impressions are all zero
    NoData,
    /// Fewer results than the configured minimum
    InsufficientActivity { results: u64, min_results: u64 },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::NoData => f.write_str("no data in range"),
            ValidationFailure::InsufficientActivity {
                results,
                min_results,
            } => write!(
                f,
                "insufficient activity: {} results, at least {} required",
                results, min_results
            ),
        }
    }
}

/// Metrics resolution errors
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("unknown time range: {0}")]
    UnknownTimeRange(String),

    /// The snapshot was computed but failed a validation gate
    #[error("{failure}")]
    Validation {
        failure: ValidationFailure,
        snapshot: Box<MetricsSnapshot>,
        time_range: TimeRange,
    },

    #[error("metrics source failed: {0}")]
    Source(#[from] StoreError),
}

/// Result type for metrics resolution
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors that end a single rule evaluation
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("{0}")]
    Validation(ValidationFailure),

    #[error("invalid conditions: {0}")]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Logic(#[from] LogicError),

    #[error("provider unavailable: {0}")]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AutomationError {
    /// Check if the rule failed a data-sufficiency gate
    pub fn is_validation(&self) -> bool {
        matches!(self, AutomationError::Validation(_))
    }
}

/// Result type for rule evaluation
pub type AutomationResult<T> = Result<T, AutomationError>;
