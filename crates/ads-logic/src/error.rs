//! Error types for expression evaluation

use thiserror::Error;

/// Result type for evaluator operations
pub type LogicResult<T> = Result<T, LogicError>;

/// Errors that can occur while building or evaluating an expression
///
/// Unknown operators are the only hard failure. Missing variables, wrong
/// operand types and similar cases degrade to `null`/`false`/defaults and are
/// reported as [`Diagnostic`](crate::Diagnostic)s instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError {
    /// Operator name is not registered
    #[error("unrecognized operator: {name}")]
    UnknownOperator { name: String },
}
