//! Tests for the scoped iteration operators
//!
//! The source operand is evaluated against the outer context; the body is
//! evaluated once per element with the element as context.

use ads_logic::{Diagnostic, Evaluator};
use serde_json::{json, Value};

fn eval_with(logic: Value, data: Value) -> Value {
    Evaluator::new().evaluate(&logic, &data).unwrap()
}

fn eval(logic: Value) -> Value {
    eval_with(logic, json!({}))
}

#[test]
fn test_filter() {
    assert_eq!(
        eval(json!({"filter": [[1, 2, 3, 4], {">": [{"var": ""}, 2]}]})),
        json!([3, 4])
    );
}

#[test]
fn test_filter_source_uses_outer_context() {
    let data = json!({
        "ads": [
            {"id": "a", "ctr": 0.4},
            {"id": "b", "ctr": 2.1},
            {"id": "c", "ctr": 1.7}
        ]
    });
    let logic = json!({
        "map": [
            {"filter": [{"var": "ads"}, {">=": [{"var": "ctr"}, 1.5]}]},
            {"var": "id"}
        ]
    });
    assert_eq!(eval_with(logic, data), json!(["b", "c"]));
}

#[test]
fn test_filter_non_sequence_is_empty() {
    assert_eq!(eval(json!({"filter": [5, true]})), json!([]));
    assert_eq!(eval(json!({"filter": [{"var": "nope"}, true]})), json!([]));
}

#[test]
fn test_map() {
    assert_eq!(
        eval(json!({"map": [[1, 2, 3], {"*": [{"var": ""}, 2]}]})),
        json!([2, 4, 6])
    );
    assert_eq!(eval(json!({"map": ["abc", {"var": ""}]})), json!([]));
}

#[test]
fn test_reduce() {
    assert_eq!(
        eval(json!({"reduce": [[1, 2, 3], {"+": [{"var": "current"}, {"var": "accumulator"}]}, 0]})),
        json!(6)
    );
}

#[test]
fn test_reduce_seed_from_outer_context() {
    let logic = json!({
        "reduce": [
            {"var": "daily_spend"},
            {"+": [{"var": "current"}, {"var": "accumulator"}]},
            {"var": "carry_over"}
        ]
    });
    let data = json!({"daily_spend": [10, 20.5], "carry_over": 4});
    assert_eq!(eval_with(logic, data), json!(34.5));
}

#[test]
fn test_reduce_without_seed_or_source() {
    assert_eq!(
        eval(json!({"reduce": [[], {"+": [{"var": "current"}, 1]}]})),
        json!(null)
    );
    assert_eq!(
        eval(json!({"reduce": ["nope", {"var": "current"}, 7]})),
        json!(7)
    );
}

#[test]
fn test_all() {
    assert_eq!(eval(json!({"all": [[1, 2, 3], {">": [{"var": ""}, 0]}]})), json!(true));
    assert_eq!(eval(json!({"all": [[1, -2, 3], {">": [{"var": ""}, 0]}]})), json!(false));
    assert_eq!(eval(json!({"all": ["nope", true]})), json!(false));
}

/// "All of nothing" is deliberately false: rules that depend on a list of
/// data points never match when the list is empty.
#[test]
fn test_all_of_empty_source_is_false() {
    assert_eq!(eval(json!({"all": [[], {">": [{"var": ""}, 0]}]})), json!(false));
    assert_eq!(eval(json!({"all": [[], true]})), json!(false));
}

#[test]
fn test_none_and_some() {
    let positive = json!({">": [{"var": ""}, 0]});
    assert_eq!(eval(json!({"none": [[-1, -2], positive.clone()]})), json!(true));
    assert_eq!(eval(json!({"none": [[-1, 2], positive.clone()]})), json!(false));
    assert_eq!(eval(json!({"some": [[-1, 2], positive.clone()]})), json!(true));
    assert_eq!(eval(json!({"some": [[-1, -2], positive.clone()]})), json!(false));

    assert_eq!(eval(json!({"none": [[], positive.clone()]})), json!(true));
    assert_eq!(eval(json!({"some": [[], positive]})), json!(false));
}

#[test]
fn test_iteration_over_non_sequence_is_diagnosed() {
    let evaluator = Evaluator::new();
    let node = evaluator.parse(&json!({"some": [{"var": "spend"}, true]}));
    let evaluation = evaluator.evaluate_traced(&node, &json!({"spend": 5})).unwrap();

    assert_eq!(evaluation.value, json!(false));
    assert_eq!(
        evaluation.diagnostics,
        vec![Diagnostic::NotASequence {
            operator: "some".to_string()
        }]
    );
}

#[test]
fn test_uses_data_covers_iteration_bodies() {
    let evaluator = Evaluator::new();
    let paths = evaluator.uses_data(&json!({
        "some": [{"var": "ads"}, {">": [{"var": "ctr"}, 1]}]
    }));
    assert!(paths.contains("ads"));
    assert!(paths.contains("ctr"));
}
