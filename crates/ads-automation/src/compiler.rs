//! Compile condition groups into one expression
//!
//! Each condition `{metric, operator, value}` becomes
//! `{operator: [{"var": metric}, value]}`. Groups are then combined:
//!
//! - `and_or_and`: AND within a group, OR across groups
//! - `or_and_or`: OR within a group, AND across groups

use ads_core::{CombinationMode, ConditionGroup, MetricCondition, MetricsSnapshot};
use ads_logic::value::number_value;
use ads_logic::{BuiltinOp, Evaluation, Evaluator, LogicResult, Node, OperatorRegistry};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{CompileError, CompileResult};

/// A rule's conditions as an evaluator tree
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledConditions {
    pub node: Node,
    /// Snapshot fields the expression reads
    pub dependencies: BTreeSet<String>,
}

impl CompiledConditions {
    /// Evaluate against a snapshot
    pub fn evaluate(
        &self,
        evaluator: &Evaluator,
        snapshot: &MetricsSnapshot,
    ) -> LogicResult<Evaluation> {
        evaluator.evaluate_traced(&self.node, &snapshot.to_context())
    }

    /// Dependencies that are not snapshot fields
    pub fn unknown_metrics(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .map(String::as_str)
            .filter(|metric| !MetricsSnapshot::has_field(metric))
            .collect()
    }

    /// JSON form, for logging
    pub fn to_value(&self) -> Value {
        self.node.to_value()
    }
}

/// Compile condition groups under a combination mode
///
/// Operator names are resolved against `registry`, so custom operators
/// registered on the evaluator may be used in conditions.
pub fn compile(
    groups: &[ConditionGroup],
    mode: &CombinationMode,
    registry: &OperatorRegistry,
) -> CompileResult<CompiledConditions> {
    let (inner, outer) = match mode {
        CombinationMode::AndOrAnd => (BuiltinOp::And, BuiltinOp::Or),
        CombinationMode::OrAndOr => (BuiltinOp::Or, BuiltinOp::And),
        CombinationMode::Unknown(other) => return Err(CompileError::UnknownMode(other.clone())),
    };

    if groups.is_empty() {
        return Err(CompileError::NoGroups);
    }

    let mut compiled_groups = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        if group.conditions.is_empty() {
            return Err(CompileError::EmptyGroup { index });
        }
        let conditions = group
            .conditions
            .iter()
            .map(|condition| compile_condition(condition, registry))
            .collect::<CompileResult<Vec<_>>>()?;
        compiled_groups.push(Node::builtin(inner, conditions));
    }

    let node = Node::builtin(outer, compiled_groups);
    let dependencies = node.uses_data();
    Ok(CompiledConditions { node, dependencies })
}

fn compile_condition(
    condition: &MetricCondition,
    registry: &OperatorRegistry,
) -> CompileResult<Node> {
    let threshold = threshold(condition)?;
    let node = Node::operation(
        &condition.operator,
        vec![Node::var(condition.metric.clone()), Node::literal(threshold)],
        registry,
    )?;
    Ok(node)
}

fn threshold(condition: &MetricCondition) -> CompileResult<Value> {
    let parsed = match &condition.value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .map(number_value)
        .ok_or_else(|| CompileError::NonNumericThreshold {
            metric: condition.metric.clone(),
            value: condition.value.to_string(),
        })
}
