//! Error reporting: detail collection, message composition, and the
//! override hooks.

use indexmap::IndexMap;
use models::{any, number, object, string, Override, ValidationOptions, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn abort_early_stops_at_the_first_failure() {
    let schema = object().keys([("a", number()), ("b", number())]);
    let result = schema.validate(Value::from(json!({"a": "x", "b": "y"})));
    let error = result.error.expect("both keys are invalid");
    assert_eq!(error.details.len(), 1);
}

#[test]
fn collect_mode_reports_every_leaf_failure() {
    let schema = object().keys([
        ("a", number()),
        ("b", number()),
        ("c", object().keys([("d", string().min(3).expect("valid limit"))])),
    ]);
    let options = ValidationOptions {
        abort_early: Some(false),
        ..ValidationOptions::default()
    };
    let result = schema.validate_with(
        Value::from(json!({"a": "x", "b": "y", "c": {"d": "zz"}})),
        &options,
    );
    let error = result.error.expect("three leaves fail");
    assert_eq!(error.details.len(), 3);
    let codes: Vec<&str> = error.details.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["number.base", "number.base", "string.min"]);
    assert_eq!(
        error.details[2].path,
        vec![
            models::PathSeg::Key("c".to_string()),
            models::PathSeg::Key("d".to_string())
        ]
    );
}

#[test]
fn details_carry_context_for_re_rendering() {
    let result = number()
        .min(2)
        .expect("valid limit")
        .validate(Value::from(1));
    let error = result.error.expect("below minimum");
    let detail = &error.details[0];
    assert_eq!(detail.code, "number.min");
    assert_eq!(detail.context.label, "value");
    assert_eq!(detail.context.extras.get("limit"), Some(&Value::from(2.0)));
    assert_eq!(detail.context.extras.get("value"), Some(&Value::from(1.0)));
}

#[test]
fn language_overrides_replace_single_templates() {
    let mut language = IndexMap::new();
    language.insert("number.min".to_string(), "way too small".to_string());
    let options = ValidationOptions {
        language: Some(language),
        ..ValidationOptions::default()
    };

    let result = number()
        .min(2)
        .expect("valid limit")
        .validate_with(Value::from(1), &options);
    let error = result.error.expect("below minimum");
    assert_eq!(error.details[0].message, "\"value\" way too small");

    // untouched codes keep their default template
    let result = number()
        .max(0)
        .expect("valid limit")
        .validate_with(Value::from(1), &options);
    assert_eq!(
        result.error.expect("above maximum").details[0].message,
        "\"value\" must be less than or equal to 0"
    );
}

#[test]
fn labels_scope_to_their_node() {
    let schema = object().keys([("first_name", string().label("First Name"))]);
    let result = schema.validate(Value::from(json!({"first_name": 1})));
    let error = result.error.expect("non-string name");
    assert_eq!(error.details[0].message, "\"First Name\" must be a string");
}

#[test]
fn message_hooks_collapse_the_message_but_keep_details() {
    let schema = object().keys([("a", number().error_message("bad a"))]);
    let result = schema.validate(Value::from(json!({"a": "x"})));
    let error = result.error.expect("invalid child");
    assert_eq!(error.message, "child \"a\" fails because [bad a]");
    // the original leaf survives flattening
    assert_eq!(error.details[0].code, "number.base");
}

#[test]
fn descriptor_hooks_replace_the_node_detail() {
    let schema = object().keys([(
        "a",
        number().error_with(|_| Override::Descriptor {
            message: "totally custom".to_string(),
            context: IndexMap::new(),
        }),
    )]);
    let result = schema.validate(Value::from(json!({"a": "x"})));
    let error = result.error.expect("invalid child");
    assert_eq!(error.details.len(), 1);
    assert_eq!(error.details[0].code, "override");
    assert_eq!(error.details[0].message, "totally custom");
}

#[test]
fn error_hooks_can_replace_the_aggregate() {
    let schema = object().keys([(
        "a",
        number().error_with(|_| {
            Override::Error(models::ValidationError::message("hard replacement"))
        }),
    )]);
    let result = schema.validate(Value::from(json!({"a": "x"})));
    let error = result.error.expect("invalid child");
    assert_eq!(error.message, "hard replacement");
    assert!(error.details.is_empty());
}

#[test]
fn noop_hooks_leave_details_untouched() {
    let schema = object().keys([("a", number().error_with(Override::Details))]);
    let result = schema.validate(Value::from(json!({"a": "x"})));
    let error = result.error.expect("invalid child");
    assert_eq!(error.details[0].code, "number.base");
}

#[test]
fn root_hooks_see_the_flattened_list() {
    let schema = object()
        .keys([("a", object().keys([("b", number())]))])
        .error_with(|details| {
            // the hook receives leaves, not wraps
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].code, "number.base");
            Override::Message("root override".to_string())
        });
    let result = schema.validate(Value::from(json!({"a": {"b": "x"}})));
    let error = result.error.expect("nested failure");
    assert_eq!(error.message, "root override");
    assert_eq!(error.details[0].code, "number.base");
}

#[test]
fn forbidden_values_report_any_unknown() {
    let result = any().forbidden().validate(Value::Null);
    assert_eq!(
        result.error.expect("null is still present").details[0].code,
        "any.unknown"
    );
}

#[test]
fn invalid_values_report_the_offender() {
    let result = any().invalid(["no"]).validate(Value::from("no"));
    let error = result.error.expect("deny-listed value");
    assert_eq!(error.details[0].code, "any.invalid");
    assert_eq!(
        error.details[0].context.extras.get("value"),
        Some(&Value::from("no"))
    );
}

#[test]
fn allow_only_reports_the_allow_list() {
    let result = any().valid([1, 2]).validate(Value::from(3));
    let error = result.error.expect("not in the allow-list");
    assert_eq!(error.details[0].code, "any.allowOnly");
    assert_eq!(
        error.details[0].message,
        "\"value\" must be one of [1, 2]"
    );
}

#[test]
fn errors_serialize_for_external_tooling() {
    let result = object()
        .keys([("a", number())])
        .validate(Value::from(json!({"a": "x"})));
    let error = result.error.expect("invalid child");
    let serialized =
        serde_json::to_value(&error.details).expect("details are a stable contract");
    assert_eq!(serialized[0]["type"], "number.base");
    assert_eq!(serialized[0]["path"], json!(["a"]));
    assert_eq!(serialized[0]["context"]["label"], "a");
}
