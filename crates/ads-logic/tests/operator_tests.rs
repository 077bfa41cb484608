//! Tests for comparison, arithmetic, logic and data operators

use ads_logic::{Evaluator, LogicError, Node};
use serde_json::{json, Value};

fn eval(logic: Value) -> Value {
    eval_with(logic, json!({}))
}

fn eval_with(logic: Value, data: Value) -> Value {
    Evaluator::new().evaluate(&logic, &data).unwrap()
}

// ============================================================================
// Comparison
// ============================================================================

#[test]
fn test_comparisons_match_native_ordering() {
    let samples = [-3.5, -1.0, 0.0, 0.5, 1.0, 2.0, 10.0];
    for a in samples {
        for b in samples {
            let cases = [
                ("==", a == b),
                ("!=", a != b),
                (">", a > b),
                (">=", a >= b),
                ("<", a < b),
                ("<=", a <= b),
            ];
            for (op, expected) in cases {
                let logic = json!({ op: [a, b] });
                assert_eq!(eval(logic), json!(expected), "{} {} {}", a, op, b);
            }
        }
    }
}

#[test]
fn test_comparisons_against_variables() {
    let data = json!({"ctr": 1.8, "cpc": 0.42});
    assert_eq!(eval_with(json!({">": [{"var": "ctr"}, 1.5]}), data.clone()), json!(true));
    assert_eq!(eval_with(json!({"<": [{"var": "cpc"}, 0.4]}), data), json!(false));
}

#[test]
fn test_loose_and_strict_equality() {
    assert_eq!(eval(json!({"==": [1, "1"]})), json!(true));
    assert_eq!(eval(json!({"===": [1, "1"]})), json!(false));
    assert_eq!(eval(json!({"!=": [1, "1"]})), json!(false));
    assert_eq!(eval(json!({"!==": [1, "1"]})), json!(true));
    assert_eq!(eval(json!({"==": [null, 0]})), json!(false));
}

#[test]
fn test_between_forms() {
    assert_eq!(eval(json!({"<": [1, 2, 3]})), json!(true));
    assert_eq!(eval(json!({"<": [1, 1, 3]})), json!(false));
    assert_eq!(eval(json!({"<=": [1, 1, 3]})), json!(true));
    assert_eq!(eval(json!({"<=": [1, 4, 3]})), json!(false));
}

#[test]
fn test_non_numeric_ordering_is_false() {
    assert_eq!(eval(json!({">": ["abc", 1]})), json!(false));
    assert_eq!(eval(json!({"<": ["abc", 1]})), json!(false));
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(eval(json!({"+": [1, 2, 3]})), json!(6));
    assert_eq!(eval(json!({"+": ["1.5", 1]})), json!(2.5));
    assert_eq!(eval(json!({"-": [10, 4]})), json!(6));
    assert_eq!(eval(json!({"-": 3})), json!(-3));
    assert_eq!(eval(json!({"*": [2, 3, 4]})), json!(24));
    assert_eq!(eval(json!({"/": [9, 2]})), json!(4.5));
    assert_eq!(eval(json!({"%": [7, 3]})), json!(1));
}

#[test]
fn test_arithmetic_degrades_to_null() {
    assert_eq!(eval(json!({"/": [1, 0]})), json!(null));
    assert_eq!(eval(json!({"%": [1, 0]})), json!(null));
    assert_eq!(eval(json!({"+": [1, "abc"]})), json!(null));
}

// ============================================================================
// Logic
// ============================================================================

#[test]
fn test_and_returns_first_falsy() {
    assert_eq!(eval(json!({"and": [true, {"==": [1, 2]}, true]})), json!(false));
    assert_eq!(eval(json!({"and": [1, "", 2]})), json!(""));
    assert_eq!(eval(json!({"and": [1, 2, 3]})), json!(3));
}

#[test]
fn test_or_returns_first_truthy() {
    assert_eq!(eval(json!({"or": [false, 0, "x", "y"]})), json!("x"));
    assert_eq!(eval(json!({"or": [false, 0]})), json!(0));
}

#[test]
fn test_and_stops_at_deciding_operand() {
    let mut evaluator = Evaluator::new();
    evaluator.add_operation("explode", |_| panic!("operand evaluated after short-circuit"));

    let result = evaluator
        .evaluate(&json!({"and": [false, {"explode": []}]}), &json!({}))
        .unwrap();
    assert_eq!(result, json!(false));

    let result = evaluator
        .evaluate(&json!({"or": [true, {"explode": []}]}), &json!({}))
        .unwrap();
    assert_eq!(result, json!(true));
}

#[test]
fn test_if_chains() {
    assert_eq!(eval(json!({"if": [false, "x", true, "y", "z"]})), json!("y"));
    assert_eq!(eval(json!({"if": [false, "x", false, "y", "z"]})), json!("z"));
    assert_eq!(eval(json!({"if": [false, "x"]})), json!(null));
    assert_eq!(eval(json!({"?:": [true, "a", "b"]})), json!("a"));
}

#[test]
fn test_negation() {
    assert_eq!(eval(json!({"!": true})), json!(false));
    assert_eq!(eval(json!({"!!": ["0"]})), json!(true));
    assert_eq!(eval(json!({"!!": [""]})), json!(false));
    assert_eq!(eval(json!({"!!": [[]]})), json!(false));
}

// ============================================================================
// Data access
// ============================================================================

#[test]
fn test_var_paths() {
    assert_eq!(eval_with(json!({"var": "a.b"}), json!({"a": {"b": 5}})), json!(5));
    assert_eq!(eval_with(json!({"var": ["a.x", 0]}), json!({"a": {"b": 5}})), json!(0));
    assert_eq!(
        eval_with(json!({"var": "items.1.name"}), json!({"items": [{"name": "a"}, {"name": "b"}]})),
        json!("b")
    );
}

#[test]
fn test_missing() {
    let data = json!({"spend": 10, "results": "", "reach": null});
    assert_eq!(
        eval_with(json!({"missing": ["spend", "results", "reach", "clicks"]}), data.clone()),
        json!(["results", "reach", "clicks"])
    );
    assert_eq!(
        eval_with(json!({"missing": {"merge": [["spend"], ["clicks"]]}}), data),
        json!(["clicks"])
    );
}

#[test]
fn test_missing_some() {
    let data = json!({"spend": 10, "clicks": 3});
    assert_eq!(
        eval_with(json!({"missing_some": [1, ["spend", "reach"]]}), data.clone()),
        json!([])
    );
    assert_eq!(
        eval_with(json!({"missing_some": [2, ["spend", "reach", "results"]]}), data),
        json!(["reach", "results"])
    );
}

// ============================================================================
// Utility
// ============================================================================

#[test]
fn test_in() {
    assert_eq!(eval(json!({"in": ["b", ["a", "b"]]})), json!(true));
    assert_eq!(eval(json!({"in": [2, ["1", "2"]]})), json!(true));
    assert_eq!(eval(json!({"in": ["ring", "spring sale"]})), json!(true));
    assert_eq!(eval(json!({"in": ["x", 5]})), json!(false));
}

#[test]
fn test_cat_max_min() {
    assert_eq!(eval(json!({"cat": ["roas ", 2, " x"]})), json!("roas 2 x"));
    assert_eq!(eval(json!({"max": [1, 5, 3]})), json!(5));
    assert_eq!(eval(json!({"min": [1, -5, 3]})), json!(-5));
    assert_eq!(eval(json!({"max": []})), json!(null));
}

#[test]
fn test_log_returns_value() {
    assert_eq!(eval(json!({"log": "hello"})), json!("hello"));
}

// ============================================================================
// Literals and errors
// ============================================================================

#[test]
fn test_literal_data_is_returned_unevaluated() {
    let multi_key = json!({"var": "a", "b": 1});
    assert_eq!(eval(multi_key.clone()), multi_key);

    let unknown_key = json!({"unknown_op": [1]});
    assert_eq!(eval(unknown_key.clone()), unknown_key);
}

#[test]
fn test_sequences_are_evaluated_elementwise() {
    assert_eq!(
        eval_with(json!([{"var": "a"}, 2, {"+": [1, 1]}]), json!({"a": 1})),
        json!([1, 2, 2])
    );
}

#[test]
fn test_unknown_operator_by_name() {
    let evaluator = Evaluator::new();
    let result = Node::operation("approximately", vec![], evaluator.registry());
    assert!(matches!(
        result,
        Err(LogicError::UnknownOperator { ref name }) if name == "approximately"
    ));
}

#[test]
fn test_custom_operator_shadows_builtin() {
    let mut evaluator = Evaluator::new();
    evaluator.add_operation("cat", |args| json!(args.len()));

    let result = evaluator.evaluate(&json!({"cat": ["a", "b", "c"]}), &json!({})).unwrap();
    assert_eq!(result, json!(3));
}
