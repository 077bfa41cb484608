//! Operator names and the per-evaluator registry

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Custom operator callable
///
/// Receives fully evaluated operands positionally.
pub type CustomOperation = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Built-in operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinOp {
    Equal,
    StrictEqual,
    NotEqual,
    StrictNotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    DoubleNegation,
    Not,
    Var,
    Missing,
    MissingSome,
    If,
    And,
    Or,
    Filter,
    Map,
    Reduce,
    AllOf,
    NoneOf,
    SomeOf,
    In,
    Cat,
    Max,
    Min,
    Merge,
    Substr,
    Log,
}

impl BuiltinOp {
    /// Every built-in, in documentation order
    pub const ALL: [BuiltinOp; 34] = [
        BuiltinOp::Equal,
        BuiltinOp::StrictEqual,
        BuiltinOp::NotEqual,
        BuiltinOp::StrictNotEqual,
        BuiltinOp::Greater,
        BuiltinOp::GreaterOrEqual,
        BuiltinOp::Less,
        BuiltinOp::LessOrEqual,
        BuiltinOp::Add,
        BuiltinOp::Subtract,
        BuiltinOp::Multiply,
        BuiltinOp::Divide,
        BuiltinOp::Modulo,
        BuiltinOp::DoubleNegation,
        BuiltinOp::Not,
        BuiltinOp::Var,
        BuiltinOp::Missing,
        BuiltinOp::MissingSome,
        BuiltinOp::If,
        BuiltinOp::And,
        BuiltinOp::Or,
        BuiltinOp::Filter,
        BuiltinOp::Map,
        BuiltinOp::Reduce,
        BuiltinOp::AllOf,
        BuiltinOp::NoneOf,
        BuiltinOp::SomeOf,
        BuiltinOp::In,
        BuiltinOp::Cat,
        BuiltinOp::Max,
        BuiltinOp::Min,
        BuiltinOp::Merge,
        BuiltinOp::Substr,
        BuiltinOp::Log,
    ];

    /// Canonical operator name
    pub fn name(self) -> &'static str {
        match self {
            BuiltinOp::Equal => "==",
            BuiltinOp::StrictEqual => "===",
            BuiltinOp::NotEqual => "!=",
            BuiltinOp::StrictNotEqual => "!==",
            BuiltinOp::Greater => ">",
            BuiltinOp::GreaterOrEqual => ">=",
            BuiltinOp::Less => "<",
            BuiltinOp::LessOrEqual => "<=",
            BuiltinOp::Add => "+",
            BuiltinOp::Subtract => "-",
            BuiltinOp::Multiply => "*",
            BuiltinOp::Divide => "/",
            BuiltinOp::Modulo => "%",
            BuiltinOp::DoubleNegation => "!!",
            BuiltinOp::Not => "!",
            BuiltinOp::Var => "var",
            BuiltinOp::Missing => "missing",
            BuiltinOp::MissingSome => "missing_some",
            BuiltinOp::If => "if",
            BuiltinOp::And => "and",
            BuiltinOp::Or => "or",
            BuiltinOp::Filter => "filter",
            BuiltinOp::Map => "map",
            BuiltinOp::Reduce => "reduce",
            BuiltinOp::AllOf => "all",
            BuiltinOp::NoneOf => "none",
            BuiltinOp::SomeOf => "some",
            BuiltinOp::In => "in",
            BuiltinOp::Cat => "cat",
            BuiltinOp::Max => "max",
            BuiltinOp::Min => "min",
            BuiltinOp::Merge => "merge",
            BuiltinOp::Substr => "substr",
            BuiltinOp::Log => "log",
        }
    }

    /// Look up a built-in by name (`?:` is an alias of `if`)
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "?:" {
            return Some(BuiltinOp::If);
        }
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }
}

/// Operator discriminant of an operation node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Builtin(BuiltinOp),
    Custom(String),
}

impl Operator {
    /// Operator name as written in rules
    pub fn name(&self) -> &str {
        match self {
            Operator::Builtin(op) => op.name(),
            Operator::Custom(name) => name,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registry of custom operators
///
/// Name resolution checks custom operators first, then built-ins.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    custom: HashMap<String, CustomOperation>,
}

impl OperatorRegistry {
    /// Create a registry holding only the built-ins
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom operator, replacing any previous one of that name
    pub fn add_operation<F>(&mut self, name: impl Into<String>, operation: F)
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.custom.insert(name.into(), Arc::new(operation));
    }

    /// Remove a custom operator; returns whether it was registered
    pub fn remove_operation(&mut self, name: &str) -> bool {
        self.custom.remove(name).is_some()
    }

    /// Resolve an operator name
    pub fn resolve(&self, name: &str) -> Option<Operator> {
        if self.custom.contains_key(name) {
            return Some(Operator::Custom(name.to_string()));
        }
        BuiltinOp::from_name(name).map(Operator::Builtin)
    }

    /// Check whether a name resolves to any operator
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Get a custom operator callable
    pub fn custom(&self, name: &str) -> Option<&CustomOperation> {
        self.custom.get(name)
    }

    /// Names of registered custom operators, sorted
    pub fn custom_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.custom.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("custom", &self.custom_names())
            .finish()
    }
}
