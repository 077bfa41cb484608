//! Declarative expression evaluator
//!
//! Rules are written as JSON operator trees. A single-key object whose key
//! names a registered operator is an operation; its value holds the operands.
//! Everything else is literal data.
//!
//! ```text
//! {"and": [{">": [{"var": "ctr"}, 1.5]}, {"<": [{"var": "cpc"}, 0.8]}]}
//! ```
//!
//! # Operators
//!
//! - Comparison: `==` `===` `!=` `!==` `>` `>=` `<` `<=` (`<`/`<=` take a 3-arg "between" form)
//! - Arithmetic: `+` `-` `*` `/` `%`
//! - Logic: `!` `!!` `and` `or` `if` / `?:` (lazy)
//! - Data: `var` `missing` `missing_some`
//! - Iteration: `filter` `map` `reduce` `all` `none` `some`
//! - Utility: `in` `cat` `max` `min` `merge` `substr` `log`
//!
//! Custom operators are registered on an [`OperatorRegistry`] owned by the
//! [`Evaluator`] and shadow built-ins of the same name.
//!
//! # Example
//!
//! ```ignore
//! use ads_logic::Evaluator;
//! use serde_json::json;
//!
//! let evaluator = Evaluator::new();
//! let result = evaluator.evaluate(&json!({"var": "a.b"}), &json!({"a": {"b": 5}}))?;
//! assert_eq!(result, json!(5));
//! ```

mod error;
mod evaluator;
mod node;
mod operators;
pub mod value;

pub use error::{LogicError, LogicResult};
pub use evaluator::{Diagnostic, Evaluation, Evaluator};
pub use node::{Node, Operation};
pub use operators::{BuiltinOp, CustomOperation, Operator, OperatorRegistry};
