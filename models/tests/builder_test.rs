//! Builder contract: clone-on-write with identity no-op fast paths, and
//! construction-class failures.

use models::{any, number, object, string, When, ValidationOptions, Value};
use serde_json::json;

#[test]
fn noop_builder_calls_return_the_same_node() {
    let base = number().required();
    assert!(base.required().same(&base));
    assert!(base.required().required().same(&base));

    let labeled = string().label("name");
    assert!(labeled.label("name").same(&labeled));
    assert!(!labeled.label("other").same(&labeled));
}

#[test]
fn changing_builder_calls_return_a_new_node() {
    let base = number();
    let required = base.required();
    assert!(!required.same(&base));
    // the original node is untouched
    assert!(base.validate(None).error.is_none());
    assert!(required.validate(None).error.is_some());
}

#[test]
fn strip_and_sparse_are_idempotent() {
    let stripped = string().strip();
    assert!(stripped.strip().same(&stripped));

    let sparse = models::array().sparse();
    assert!(sparse.sparse().same(&sparse));
}

#[test]
fn valid_deduplicates_literals() {
    let schema = any().valid([1]).valid([1]).valid([2]);
    let described = schema.describe();
    let Some(map) = described.as_object() else {
        panic!("describe must produce an object");
    };
    let Some(Value::Array(valids)) = map.get("valids") else {
        panic!("valids missing");
    };
    assert_eq!(valids.len(), 2);
}

#[test]
fn valid_removes_the_value_from_invalids() {
    let schema = any().invalid([5]).valid([5]);
    assert!(schema.validate(Value::from(5)).error.is_none());
}

#[test]
fn concat_rejects_mismatched_types() {
    let err = number()
        .concat(&string())
        .expect_err("merging number with string must fail");
    let text = err.to_string();
    assert!(text.contains("number"));
    assert!(text.contains("string"));
}

#[test]
fn when_requires_a_branch() {
    let err = number()
        .when("a", When::is(1))
        .expect_err("when() without then/otherwise must fail");
    assert!(err.to_string().contains("then"));
}

#[test]
fn rule_arguments_are_validated_at_build_time() {
    let err = models::date()
        .min("not a date")
        .expect_err("unparsable date limits must fail");
    assert!(err.to_string().contains("min"));

    // out of range for a millisecond timestamp
    assert!(models::date().min(i64::MAX).is_err());
    // size limits must be whole and non-negative
    assert!(string().min(2.5).is_err());
    assert!(string().min(-1).is_err());
    // a multiple base must be positive
    assert!(number().multiple(0).is_err());

    assert!(models::date().min("1-1-2000 UTC").is_ok());
    assert!(number().min(-1).is_ok());
}

#[test]
fn options_rejects_context_overrides() {
    let mut settings = ValidationOptions::default();
    settings.context = Some(Value::from(json!({"x": 1})));
    assert!(number().options(settings).is_err());
}

#[test]
fn strict_disables_conversion_for_the_subtree() {
    let schema = number().strict();
    assert!(schema.validate(Value::from("5")).error.is_some());
    assert!(schema.validate(Value::from(5)).error.is_none());
}

#[test]
fn schemas_are_shareable_across_validations() {
    let schema = object().keys([("a", number())]);
    let first = schema.validate(Value::from(json!({"a": 1})));
    let second = schema.validate(Value::from(json!({"a": "nope"})));
    assert!(first.error.is_none());
    assert!(second.error.is_some());
    // the node itself is untouched by either call
    assert!(schema.validate(Value::from(json!({"a": 2}))).error.is_none());
}
