//! Parsed expression tree
//!
//! Raw JSON is parsed once into [`Node`]s so that evaluation never has to ask
//! "is this an object with exactly one operator key" again.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::{LogicError, LogicResult};
use crate::operators::{BuiltinOp, Operator, OperatorRegistry};
use crate::value::to_text;

/// A node of an expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Scalar or non-operator object, returned as-is
    Literal(Value),
    /// Sequence whose elements are evaluated in order
    Array(Vec<Node>),
    /// Operator applied to operands
    Operation(Operation),
}

/// Operator plus its (unevaluated) operands
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operator: Operator,
    pub args: Vec<Node>,
}

impl Node {
    /// Parse a JSON tree against the operators known to `registry`
    ///
    /// Objects with exactly one key naming a known operator become
    /// operations; any other object is literal data.
    pub fn parse(value: &Value, registry: &OperatorRegistry) -> Node {
        match value {
            Value::Array(items) => {
                Node::Array(items.iter().map(|v| Node::parse(v, registry)).collect())
            }
            Value::Object(map) => {
                let operation = single_entry(map).and_then(|(name, operands)| {
                    registry
                        .resolve(name)
                        .map(|operator| (operator, operands))
                });
                match operation {
                    Some((operator, operands)) => Node::Operation(Operation {
                        operator,
                        args: parse_operands(operands, registry),
                    }),
                    None => Node::Literal(value.clone()),
                }
            }
            _ => Node::Literal(value.clone()),
        }
    }

    /// Build an operation by operator name
    ///
    /// Fails with [`LogicError::UnknownOperator`] when the name is not
    /// registered.
    pub fn operation(
        name: &str,
        args: Vec<Node>,
        registry: &OperatorRegistry,
    ) -> LogicResult<Node> {
        let operator = registry
            .resolve(name)
            .ok_or_else(|| LogicError::UnknownOperator {
                name: name.to_string(),
            })?;
        Ok(Node::Operation(Operation { operator, args }))
    }

    /// Build a built-in operation
    pub fn builtin(op: BuiltinOp, args: Vec<Node>) -> Node {
        Node::Operation(Operation {
            operator: Operator::Builtin(op),
            args,
        })
    }

    /// Build a literal node
    pub fn literal(value: impl Into<Value>) -> Node {
        Node::Literal(value.into())
    }

    /// Build a `var` lookup
    pub fn var(path: impl Into<String>) -> Node {
        Node::builtin(BuiltinOp::Var, vec![Node::Literal(Value::String(path.into()))])
    }

    /// Convert back to the JSON form
    pub fn to_value(&self) -> Value {
        match self {
            Node::Literal(value) => value.clone(),
            Node::Array(items) => Value::Array(items.iter().map(Node::to_value).collect()),
            Node::Operation(op) => {
                let mut map = Map::new();
                map.insert(
                    op.operator.name().to_string(),
                    Value::Array(op.args.iter().map(Node::to_value).collect()),
                );
                Value::Object(map)
            }
        }
    }

    /// Collect the data paths this expression reads
    ///
    /// Walks the tree without evaluating it. Paths come from literal `var`
    /// operands and the literal key lists of `missing` / `missing_some`.
    pub fn uses_data(&self) -> BTreeSet<String> {
        let mut paths = BTreeSet::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths(&self, paths: &mut BTreeSet<String>) {
        match self {
            Node::Literal(_) => {}
            Node::Array(items) => {
                for item in items {
                    item.collect_paths(paths);
                }
            }
            Node::Operation(op) => {
                match op.operator {
                    Operator::Builtin(BuiltinOp::Var) => {
                        if let Some(Node::Literal(path)) = op.args.first() {
                            insert_path(paths, path);
                        }
                    }
                    Operator::Builtin(BuiltinOp::Missing) => {
                        for arg in &op.args {
                            literal_keys(arg, paths);
                        }
                    }
                    Operator::Builtin(BuiltinOp::MissingSome) => {
                        if let Some(keys) = op.args.get(1) {
                            literal_keys(keys, paths);
                        }
                    }
                    _ => {}
                }
                for arg in &op.args {
                    arg.collect_paths(paths);
                }
            }
        }
    }
}

fn single_entry(map: &Map<String, Value>) -> Option<(&String, &Value)> {
    if map.len() == 1 {
        map.iter().next()
    } else {
        None
    }
}

fn parse_operands(operands: &Value, registry: &OperatorRegistry) -> Vec<Node> {
    match operands {
        Value::Array(items) => items.iter().map(|v| Node::parse(v, registry)).collect(),
        other => vec![Node::parse(other, registry)],
    }
}

fn insert_path(paths: &mut BTreeSet<String>, path: &Value) {
    let text = match path {
        Value::String(s) => s.clone(),
        Value::Number(_) => to_text(path),
        _ => return,
    };
    if !text.is_empty() {
        paths.insert(text);
    }
}

fn literal_keys(node: &Node, paths: &mut BTreeSet<String>) {
    match node {
        Node::Literal(Value::Array(keys)) => {
            for key in keys {
                insert_path(paths, key);
            }
        }
        Node::Literal(key) => insert_path(paths, key),
        Node::Array(items) => {
            for item in items {
                if let Node::Literal(key) = item {
                    insert_path(paths, key);
                }
            }
        }
        Node::Operation(_) => {}
    }
}
