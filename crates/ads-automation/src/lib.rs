//! Metric-driven budget automation
//!
//! One run walks every active rule in turn:
//!
//! 1. resolve the rule's asset
//! 2. resolve a validated [`MetricsSnapshot`](ads_core::MetricsSnapshot)
//!    over the rule's dominant time range
//! 3. compile the condition groups into an expression and evaluate it
//!    against the snapshot
//! 4. on a match, execute the budget actions through the asset's provider
//! 5. append one history record
//!
//! A failing rule is logged, counted and recorded; it never stops the run.

mod clock;
mod compiler;
mod engine;
mod error;
mod executor;
mod lease;
mod resolver;
pub mod time_range;

pub use clock::{Clock, FixedClock, SystemClock};
pub use compiler::{compile, CompiledConditions};
pub use engine::{AutomationEngine, Collaborators, RunRequest};
pub use error::{
    AutomationError, AutomationResult, CompileError, CompileResult, MetricsError, MetricsResult,
    ValidationFailure,
};
pub use executor::{plan_budget_change, ActionExecutor, BudgetPlan};
pub use lease::{AssetLease, AssetLeases};
pub use resolver::{derive_snapshot, MetricsResolver, ResolvedMetrics};
