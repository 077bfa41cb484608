//! Expression evaluation
//!
//! The evaluator walks a parsed [`Node`] tree against a JSON context. Control
//! flow operators (`if`, `and`, `or`) evaluate their operands one at a time;
//! iteration operators evaluate their body once per element with that element
//! as the context.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::error::{LogicError, LogicResult};
use crate::node::{Node, Operation};
use crate::operators::{BuiltinOp, Operator, OperatorRegistry};
use crate::value::{
    compare, is_truthy, loose_eq, number_value, strict_eq, to_number, to_text,
};

static NULL_NODE: Node = Node::Literal(Value::Null);

/// Something the evaluator papered over while producing a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A `var` path did not resolve; the default was used
    MissingVariable { path: String },
    /// An arithmetic operand had no numeric reading
    NonNumericOperand { operator: String },
    /// Division or modulo by zero produced `null`
    DivisionByZero { operator: String },
    /// An iteration operator received something other than a sequence
    NotASequence { operator: String },
}

/// Value plus the diagnostics collected while computing it
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: Value,
    pub diagnostics: Vec<Diagnostic>,
}

impl Evaluation {
    /// Truthiness of the value
    pub fn is_truthy(&self) -> bool {
        is_truthy(&self.value)
    }

    /// Whether evaluation needed no fallbacks
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Paths that fell back to their default
    pub fn missing_paths(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::MissingVariable { path } => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Expression evaluator
///
/// Each evaluator owns its operator registry, so two evaluators with
/// different custom operators never interfere.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    registry: OperatorRegistry,
}

impl Evaluator {
    /// Create an evaluator with only the built-in operators
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an evaluator over an existing registry
    pub fn with_registry(registry: OperatorRegistry) -> Self {
        Self { registry }
    }

    /// The operator registry
    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Register a custom operator
    ///
    /// The callable receives fully evaluated operands and shadows any
    /// built-in with the same name.
    pub fn add_operation<F>(&mut self, name: impl Into<String>, operation: F)
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.registry.add_operation(name, operation);
    }

    /// Parse raw JSON into a node tree
    pub fn parse(&self, logic: &Value) -> Node {
        Node::parse(logic, &self.registry)
    }

    /// Parse and evaluate raw JSON logic
    pub fn evaluate(&self, logic: &Value, data: &Value) -> LogicResult<Value> {
        self.evaluate_node(&self.parse(logic), data)
    }

    /// Evaluate a parsed tree
    pub fn evaluate_node(&self, node: &Node, data: &Value) -> LogicResult<Value> {
        let mut diagnostics = Vec::new();
        self.eval(node, data, &mut diagnostics)
    }

    /// Evaluate a parsed tree, keeping the diagnostics
    pub fn evaluate_traced(&self, node: &Node, data: &Value) -> LogicResult<Evaluation> {
        let mut diagnostics = Vec::new();
        let value = self.eval(node, data, &mut diagnostics)?;
        trace!(%value, diagnostics = diagnostics.len(), "Expression evaluated");
        Ok(Evaluation { value, diagnostics })
    }

    /// Data paths referenced by raw JSON logic
    pub fn uses_data(&self, logic: &Value) -> BTreeSet<String> {
        self.parse(logic).uses_data()
    }

    fn eval(&self, node: &Node, data: &Value, diag: &mut Vec<Diagnostic>) -> LogicResult<Value> {
        match node {
            Node::Literal(value) => Ok(value.clone()),
            Node::Array(items) => items
                .iter()
                .map(|item| self.eval(item, data, diag))
                .collect::<LogicResult<Vec<_>>>()
                .map(Value::Array),
            Node::Operation(op) => self.apply(op, data, diag),
        }
    }

    fn eval_args(
        &self,
        args: &[Node],
        data: &Value,
        diag: &mut Vec<Diagnostic>,
    ) -> LogicResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, data, diag)).collect()
    }

    fn apply(&self, op: &Operation, data: &Value, diag: &mut Vec<Diagnostic>) -> LogicResult<Value> {
        let builtin = match &op.operator {
            Operator::Custom(name) => {
                let callable = self.registry.custom(name).cloned().ok_or_else(|| {
                    LogicError::UnknownOperator { name: name.clone() }
                })?;
                let values = self.eval_args(&op.args, data, diag)?;
                return Ok(callable(&values));
            }
            Operator::Builtin(builtin) => *builtin,
        };

        match builtin {
            BuiltinOp::If => self.eval_if(&op.args, data, diag),
            BuiltinOp::And => self.eval_and(&op.args, data, diag),
            BuiltinOp::Or => self.eval_or(&op.args, data, diag),
            BuiltinOp::Filter => {
                let (source, body) = self.scoped(builtin, &op.args, data, diag)?;
                Ok(Value::Array(self.filter(source, body, diag)?))
            }
            BuiltinOp::Map => {
                let (source, body) = self.scoped(builtin, &op.args, data, diag)?;
                let mapped = source
                    .iter()
                    .map(|item| self.eval(body, item, diag))
                    .collect::<LogicResult<Vec<_>>>()?;
                Ok(Value::Array(mapped))
            }
            BuiltinOp::Reduce => self.eval_reduce(&op.args, data, diag),
            BuiltinOp::AllOf => {
                let (source, body) = self.scoped(builtin, &op.args, data, diag)?;
                if source.is_empty() {
                    return Ok(Value::Bool(false));
                }
                for item in &source {
                    if !is_truthy(&self.eval(body, item, diag)?) {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            BuiltinOp::NoneOf => {
                let (source, body) = self.scoped(builtin, &op.args, data, diag)?;
                Ok(Value::Bool(self.filter(source, body, diag)?.is_empty()))
            }
            BuiltinOp::SomeOf => {
                let (source, body) = self.scoped(builtin, &op.args, data, diag)?;
                Ok(Value::Bool(!self.filter(source, body, diag)?.is_empty()))
            }
            eager => {
                let values = self.eval_args(&op.args, data, diag)?;
                Ok(apply_eager(eager, &values, data, diag))
            }
        }
    }

    fn eval_if(&self, args: &[Node], data: &Value, diag: &mut Vec<Diagnostic>) -> LogicResult<Value> {
        let mut pairs = args.chunks_exact(2);
        for pair in pairs.by_ref() {
            if is_truthy(&self.eval(&pair[0], data, diag)?) {
                return self.eval(&pair[1], data, diag);
            }
        }
        match pairs.remainder() {
            [otherwise] => self.eval(otherwise, data, diag),
            _ => Ok(Value::Null),
        }
    }

    fn eval_and(&self, args: &[Node], data: &Value, diag: &mut Vec<Diagnostic>) -> LogicResult<Value> {
        let mut last = Value::Null;
        for arg in args {
            let value = self.eval(arg, data, diag)?;
            if !is_truthy(&value) {
                return Ok(value);
            }
            last = value;
        }
        Ok(last)
    }

    fn eval_or(&self, args: &[Node], data: &Value, diag: &mut Vec<Diagnostic>) -> LogicResult<Value> {
        let mut last = Value::Null;
        for arg in args {
            let value = self.eval(arg, data, diag)?;
            if is_truthy(&value) {
                return Ok(value);
            }
            last = value;
        }
        Ok(last)
    }

    fn eval_reduce(
        &self,
        args: &[Node],
        data: &Value,
        diag: &mut Vec<Diagnostic>,
    ) -> LogicResult<Value> {
        let seed = match args.get(2) {
            Some(initial) => self.eval(initial, data, diag)?,
            None => Value::Null,
        };
        let (source, body) = self.scoped(BuiltinOp::Reduce, args, data, diag)?;

        let mut accumulator = seed;
        for current in source {
            let mut scope = Map::new();
            scope.insert("current".to_string(), current);
            scope.insert("accumulator".to_string(), accumulator);
            accumulator = self.eval(body, &Value::Object(scope), diag)?;
        }
        Ok(accumulator)
    }

    /// Evaluate the source operand under the outer context and hand back the
    /// body node; a non-sequence source yields no elements.
    fn scoped<'a>(
        &self,
        op: BuiltinOp,
        args: &'a [Node],
        data: &Value,
        diag: &mut Vec<Diagnostic>,
    ) -> LogicResult<(Vec<Value>, &'a Node)> {
        let source = match args.first() {
            Some(node) => self.eval(node, data, diag)?,
            None => Value::Null,
        };
        let body = args.get(1).unwrap_or(&NULL_NODE);

        match source {
            Value::Array(items) => Ok((items, body)),
            _ => {
                diag.push(Diagnostic::NotASequence {
                    operator: op.name().to_string(),
                });
                Ok((Vec::new(), body))
            }
        }
    }

    fn filter(
        &self,
        source: Vec<Value>,
        predicate: &Node,
        diag: &mut Vec<Diagnostic>,
    ) -> LogicResult<Vec<Value>> {
        let mut kept = Vec::new();
        for item in source {
            if is_truthy(&self.eval(predicate, &item, diag)?) {
                kept.push(item);
            }
        }
        Ok(kept)
    }
}

fn arg(values: &[Value], index: usize) -> &Value {
    values.get(index).unwrap_or(&Value::Null)
}

fn apply_eager(op: BuiltinOp, values: &[Value], data: &Value, diag: &mut Vec<Diagnostic>) -> Value {
    use std::cmp::Ordering::{Equal, Greater, Less};

    let ordered = |a: &Value, b: &Value, accept: &[std::cmp::Ordering]| {
        compare(a, b).map(|o| accept.contains(&o)).unwrap_or(false)
    };

    match op {
        BuiltinOp::Equal => Value::Bool(loose_eq(arg(values, 0), arg(values, 1))),
        BuiltinOp::StrictEqual => Value::Bool(strict_eq(arg(values, 0), arg(values, 1))),
        BuiltinOp::NotEqual => Value::Bool(!loose_eq(arg(values, 0), arg(values, 1))),
        BuiltinOp::StrictNotEqual => Value::Bool(!strict_eq(arg(values, 0), arg(values, 1))),
        BuiltinOp::Greater => Value::Bool(ordered(arg(values, 0), arg(values, 1), &[Greater])),
        BuiltinOp::GreaterOrEqual => {
            Value::Bool(ordered(arg(values, 0), arg(values, 1), &[Greater, Equal]))
        }
        BuiltinOp::Less | BuiltinOp::LessOrEqual => {
            let accept: &[std::cmp::Ordering] = if op == BuiltinOp::Less {
                &[Less]
            } else {
                &[Less, Equal]
            };
            let lower = ordered(arg(values, 0), arg(values, 1), accept);
            if values.len() >= 3 {
                Value::Bool(lower && ordered(arg(values, 1), arg(values, 2), accept))
            } else {
                Value::Bool(lower)
            }
        }
        BuiltinOp::Add => match numbers(op, values, diag) {
            Some(ns) => number_value(ns.iter().sum()),
            None => Value::Null,
        },
        BuiltinOp::Multiply => match numbers(op, values, diag) {
            Some(ns) if !ns.is_empty() => number_value(ns.iter().product()),
            _ => Value::Null,
        },
        BuiltinOp::Subtract => match numbers(op, values, diag).as_deref() {
            Some([single]) => number_value(-single),
            Some([a, b, ..]) => number_value(a - b),
            _ => Value::Null,
        },
        BuiltinOp::Divide | BuiltinOp::Modulo => match numbers(op, values, diag).as_deref() {
            Some([_, b, ..]) if *b == 0.0 => {
                diag.push(Diagnostic::DivisionByZero {
                    operator: op.name().to_string(),
                });
                Value::Null
            }
            Some([a, b, ..]) if op == BuiltinOp::Divide => number_value(a / b),
            Some([a, b, ..]) => number_value(a % b),
            _ => Value::Null,
        },
        BuiltinOp::DoubleNegation => Value::Bool(is_truthy(arg(values, 0))),
        BuiltinOp::Not => Value::Bool(!is_truthy(arg(values, 0))),
        BuiltinOp::Var => var(values, data, diag),
        BuiltinOp::Missing => Value::Array(missing(values, data)),
        BuiltinOp::MissingSome => missing_some(values, data),
        BuiltinOp::In => {
            let needle = arg(values, 0);
            let found = match arg(values, 1) {
                Value::Array(items) => items.iter().any(|item| loose_eq(item, needle)),
                Value::String(_) if needle.is_null() => false,
                Value::String(haystack) => haystack.contains(&to_text(needle)),
                _ => false,
            };
            Value::Bool(found)
        }
        BuiltinOp::Cat => Value::String(values.iter().map(to_text).collect()),
        BuiltinOp::Max | BuiltinOp::Min => {
            let parsed: Option<Vec<f64>> = values.iter().map(to_number).collect();
            let extreme = parsed.and_then(|ns| {
                ns.into_iter().reduce(|a, b| {
                    if op == BuiltinOp::Max {
                        a.max(b)
                    } else {
                        a.min(b)
                    }
                })
            });
            extreme.map(number_value).unwrap_or(Value::Null)
        }
        BuiltinOp::Merge => merge(values),
        BuiltinOp::Substr => substr(values),
        BuiltinOp::Log => {
            let value = arg(values, 0).clone();
            debug!(%value, "Expression log");
            value
        }
        // Lazy and scoped operators are dispatched before reaching here
        BuiltinOp::If
        | BuiltinOp::And
        | BuiltinOp::Or
        | BuiltinOp::Filter
        | BuiltinOp::Map
        | BuiltinOp::Reduce
        | BuiltinOp::AllOf
        | BuiltinOp::NoneOf
        | BuiltinOp::SomeOf => Value::Null,
    }
}

fn numbers(op: BuiltinOp, values: &[Value], diag: &mut Vec<Diagnostic>) -> Option<Vec<f64>> {
    let parsed: Option<Vec<f64>> = values.iter().map(to_number).collect();
    if parsed.is_none() {
        diag.push(Diagnostic::NonNumericOperand {
            operator: op.name().to_string(),
        });
    }
    parsed
}

/// Walk a dotted path through objects and arrays
pub(crate) fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn path_text(path: &Value) -> Option<String> {
    match path {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(to_text(other)),
    }
}

fn var(values: &[Value], data: &Value, diag: &mut Vec<Diagnostic>) -> Value {
    let Some(path) = path_text(arg(values, 0)) else {
        return data.clone();
    };
    let default = arg(values, 1).clone();

    match lookup(data, &path) {
        Some(Value::Null) => default,
        Some(found) => found.clone(),
        None => {
            diag.push(Diagnostic::MissingVariable { path });
            default
        }
    }
}

fn is_absent(data: &Value, key: &Value) -> bool {
    let path = to_text(key);
    match lookup(data, &path) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn missing(values: &[Value], data: &Value) -> Vec<Value> {
    let keys: &[Value] = match values.first() {
        Some(Value::Array(items)) => items,
        _ => values,
    };
    keys.iter()
        .filter(|key| is_absent(data, key))
        .cloned()
        .collect()
}

fn missing_some(values: &[Value], data: &Value) -> Value {
    let need = to_number(arg(values, 0)).unwrap_or(0.0).max(0.0) as usize;
    let keys = match arg(values, 1) {
        Value::Array(items) => items.clone(),
        _ => Vec::new(),
    };
    let absent = missing(&[Value::Array(keys.clone())], data);

    if keys.len() - absent.len() >= need {
        Value::Array(Vec::new())
    } else {
        Value::Array(absent)
    }
}

fn merge(values: &[Value]) -> Value {
    if !values.iter().any(Value::is_object) {
        let mut merged = Vec::new();
        for value in values {
            match value {
                Value::Array(items) => merged.extend(items.iter().cloned()),
                other => merged.push(other.clone()),
            }
        }
        return Value::Array(merged);
    }

    let mut merged = Map::new();
    let mut next_index = 0usize;
    let mut append = |merged: &mut Map<String, Value>, value: Value| {
        while merged.contains_key(&next_index.to_string()) {
            next_index += 1;
        }
        merged.insert(next_index.to_string(), value);
        next_index += 1;
    };

    for value in values {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    merged.insert(k.clone(), v.clone());
                }
            }
            Value::Array(items) => {
                for item in items {
                    append(&mut merged, item.clone());
                }
            }
            other => append(&mut merged, other.clone()),
        }
    }
    Value::Object(merged)
}

fn substr(values: &[Value]) -> Value {
    let chars: Vec<char> = to_text(arg(values, 0)).chars().collect();
    let len = chars.len() as i64;

    // Float casts saturate, so huge operands stay in range after clamping
    let start = to_number(arg(values, 1)).unwrap_or(0.0) as i64;
    let start = if start < 0 {
        len.saturating_add(start).max(0)
    } else {
        start.min(len)
    };

    let end = match values.get(2).and_then(to_number) {
        Some(count) if count < 0.0 => len.saturating_add(count as i64).max(start),
        Some(count) => start.saturating_add(count as i64).min(len),
        None => len,
    };

    Value::String(chars[start as usize..end as usize].iter().collect())
}
