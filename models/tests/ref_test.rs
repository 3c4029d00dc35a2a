//! Reference construction and resolution through the executor.

use models::{any, array, number, object, ref_, ref_with, string, RefOptions, ValidationOptions, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn reference_exposes_root_and_display_path() {
    let reference = ref_("a.b.c");
    assert_eq!(reference.root(), "a");
    assert_eq!(reference.display_path(), "ref:a.b.c");
    assert!(!reference.is_context());

    let context = ref_("$flags.strict");
    assert!(context.is_context());
    assert_eq!(context.display_path(), "context:flags.strict");
}

#[test]
fn custom_separator_changes_path_splitting() {
    let reference = ref_with(
        "a+b",
        RefOptions {
            separator: Some('+'),
            context_prefix: None,
        },
    );
    assert_eq!(reference.root(), "a");
}

#[test]
fn valid_ref_matches_a_sibling_value() {
    let schema = object().keys([
        ("a", any().valid_ref(ref_("b")).required()),
        ("b", any()),
    ]);

    assert!(schema
        .validate(Value::from(json!({"a": 5, "b": 5})))
        .error
        .is_none());

    let failed = schema.validate(Value::from(json!({"a": 5, "b": 6})));
    let error = failed.error.expect("mismatched reference must fail");
    assert_eq!(error.details[0].code, "any.allowOnly");
}

#[test]
fn context_refs_resolve_against_the_options_context() {
    let schema = object().keys([("a", any().valid_ref(ref_("$x")).required())]);
    let options = ValidationOptions {
        context: Some(Value::from(json!({"x": 42}))),
        ..ValidationOptions::default()
    };

    assert!(schema
        .validate_with(Value::from(json!({"a": 42})), &options)
        .error
        .is_none());
    assert!(schema
        .validate_with(Value::from(json!({"a": 41})), &options)
        .error
        .is_some());
}

#[test]
fn numeric_rule_refs_resolve_at_validate_time() {
    let schema = object().keys([
        ("limit", number()),
        ("a", number().min(ref_("limit")).expect("valid limit")),
    ]);

    assert!(schema
        .validate(Value::from(json!({"limit": 3, "a": 5})))
        .error
        .is_none());

    let failed = schema.validate(Value::from(json!({"limit": 3, "a": 2})));
    let error = failed.error.expect("value below referenced limit must fail");
    assert_eq!(error.details[0].code, "number.min");
}

#[test]
fn a_non_number_referent_fails_with_a_ref_error() {
    let schema = object().keys([
        ("limit", string()),
        ("a", number().min(ref_("limit")).expect("valid limit")),
    ]);

    let failed = schema.validate(Value::from(json!({"limit": "big", "a": 2})));
    let error = failed.error.expect("non-numeric referent must fail");
    assert_eq!(error.details[0].code, "number.ref");
    assert_eq!(
        error.details[0].message,
        "\"a\" references \"limit\" which is not a number"
    );
}

#[test]
fn size_limits_reject_unsafe_integer_referents() {
    let schema = object().keys([
        ("limit", number()),
        ("a", array().min(ref_("limit")).expect("valid limit")),
    ]);

    // 2^53 is no longer exactly representable as an integer
    let failed = schema.validate(Value::from(json!({
        "limit": 9_007_199_254_740_992.0_f64,
        "a": [1, 2]
    })));
    let error = failed.error.expect("unsafe referent must fail");
    assert_eq!(error.details[0].code, "array.ref");
    assert_eq!(
        error.details[0].message,
        "\"a\" references \"limit\" which is not a positive integer"
    );
}

#[test]
fn missing_referent_is_absent_not_an_error_for_valid_sets() {
    // an unresolved reference simply never matches
    let schema = object().keys([("a", any().valid_ref(ref_("missing")).required())]);
    let failed = schema.validate(Value::from(json!({"a": 1})));
    assert_eq!(
        failed.error.expect("no referent to match").details[0].code,
        "any.allowOnly"
    );
}

#[test]
fn default_refs_resolve_regardless_of_declaration_order() {
    let forward = object().keys([
        ("a", any().default_ref(ref_("b"))),
        ("b", any()),
    ]);
    let result = forward.validate(Value::from(json!({"b": 6})));
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"a": 6, "b": 6}))));

    let backward = object().keys([
        ("b", any()),
        ("a", any().default_ref(ref_("b"))),
    ]);
    let result = backward.validate(Value::from(json!({"b": 6})));
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"a": 6, "b": 6}))));
}

#[test]
fn is_ref_distinguishes_raw_inputs() {
    assert!(models::is_ref(&models::Raw::from(ref_("a"))));
    assert!(!models::is_ref(&models::Raw::from(1)));
}
