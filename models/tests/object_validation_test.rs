//! Object recursion: children, unknown keys, renames, dependencies and the
//! two-pass default pipeline.

use models::{
    any, number, object, ref_, string, RenameOptions, StripUnknown, ValidationOptions, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn fails_with(result: models::Validated, code: &str) -> models::Detail {
    let mut error = result.error.expect("validation must fail");
    let detail = error.details.remove(0);
    assert_eq!(detail.code, code);
    detail
}

#[test]
fn child_failures_are_path_addressed() {
    let schema = object().keys([("a", object().keys([("b", number())]))]);
    let result = schema.validate(Value::from(json!({"a": {"b": "no"}})));
    let error = result.error.expect("nested mismatch must fail");
    assert_eq!(error.details[0].code, "number.base");
    assert_eq!(
        error.details[0].path,
        vec![
            models::PathSeg::Key("a".to_string()),
            models::PathSeg::Key("b".to_string())
        ]
    );
    assert_eq!(
        error.message,
        "child \"a\" fails because [child \"b\" fails because [\"b\" must be a number]]"
    );
}

#[test]
fn missing_required_children_fail() {
    let schema = object().keys([("a", number().required())]);
    let detail = fails_with(schema.validate(Value::from(json!({}))), "any.required");
    assert_eq!(detail.message, "\"a\" is required");
}

#[test]
fn forbidden_children_reject_explicit_null() {
    let schema = object().keys([("a", any().forbidden())]);
    assert!(schema.validate(Value::from(json!({}))).error.is_none());
    fails_with(schema.validate(Value::from(json!({"a": null}))), "any.unknown");
}

#[test]
fn unknown_keys_are_rejected_by_default() {
    let schema = object().keys([("a", number())]);
    let detail = fails_with(
        schema.validate(Value::from(json!({"a": 1, "x": 2}))),
        "object.allowUnknown",
    );
    assert_eq!(detail.message, "\"x\" is not allowed");
    assert_eq!(detail.path, vec![models::PathSeg::Key("x".to_string())]);
}

#[test]
fn unknown_keys_can_be_allowed_or_stripped() {
    let schema = object().keys([("a", number())]);

    let allowing = ValidationOptions {
        allow_unknown: Some(true),
        ..ValidationOptions::default()
    };
    let result = schema.validate_with(Value::from(json!({"a": 1, "x": 2})), &allowing);
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"a": 1.0, "x": 2}))));

    let stripping = ValidationOptions {
        strip_unknown: Some(StripUnknown {
            arrays: false,
            objects: true,
        }),
        ..ValidationOptions::default()
    };
    let result = schema.validate_with(Value::from(json!({"a": 1, "x": 2})), &stripping);
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"a": 1.0}))));
}

#[test]
fn unknown_can_be_granted_per_node() {
    let schema = object().keys([("a", number())]).unknown(true);
    assert!(schema
        .validate(Value::from(json!({"a": 1, "x": 2})))
        .error
        .is_none());
}

#[test]
fn an_object_without_declared_keys_allows_anything() {
    assert!(object()
        .validate(Value::from(json!({"a": 1, "b": "x"})))
        .error
        .is_none());
}

#[test]
fn an_explicit_empty_key_set_is_strict() {
    let empty: Vec<(String, models::Schema)> = Vec::new();
    let schema = object().keys(empty);
    fails_with(
        schema.validate(Value::from(json!({"a": 1}))),
        "object.allowUnknown",
    );
}

#[test]
fn stripped_children_vanish_from_the_output() {
    let schema = object().keys([("a", number()), ("secret", string().strip())]);
    let result = schema.validate(Value::from(json!({"a": 1, "secret": "s"})));
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"a": 1.0}))));
}

#[test]
fn json_strings_convert_to_objects() {
    let schema = object().keys([("a", number())]);
    let result = schema.validate(Value::from("{\"a\": 1}"));
    assert!(result.error.is_none());

    fails_with(schema.validate(Value::from("not json")), "object.base");
}

#[test]
fn default_values_fill_absent_keys() {
    let schema = object().keys([
        ("a", number().default_value(42)),
        ("b", number().required()),
    ]);
    let result = schema.validate(Value::from(json!({"b": 1})));
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"a": 42, "b": 1.0}))));
}

#[test]
fn no_defaults_suppresses_every_default_form() {
    let schema = object().keys([
        ("a", number().default_value(42)),
        ("b", any().default_ref(ref_("c"))),
        ("c", any()),
        (
            "d",
            any().default_fn("forty-three", |_| Ok(Value::from(43))),
        ),
    ]);
    let options = ValidationOptions {
        no_defaults: Some(true),
        ..ValidationOptions::default()
    };
    let result = schema.validate_with(Value::from(json!({"c": 1})), &options);
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"c": 1}))));
}

#[test]
fn function_defaults_receive_the_validated_parent() {
    let schema = object().keys([
        ("a", number()),
        (
            "sum",
            number().default_fn("double of a", |parent| {
                let a = parent
                    .and_then(|p| p.lookup(&["a".to_string()]))
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                Ok(Value::from(a * 2.0))
            }),
        ),
    ]);
    let result = schema.validate(Value::from(json!({"a": "21"})));
    assert!(result.error.is_none());
    // the parent handed to the default already carries the coerced value
    assert_eq!(
        result.value,
        Some(Value::from(json!({"a": 21.0, "sum": 42.0})))
    );
}

#[test]
fn failing_default_functions_surface_as_any_default() {
    let schema = object().keys([(
        "a",
        any().default_fn("boom", |_| Err("exploded".to_string())),
    )]);
    let result = schema.validate(Value::from(json!({})));
    let error = result.error.expect("failing default must surface");
    assert_eq!(error.details[0].code, "any.default");
    assert_eq!(
        error.details[0].context.extras.get("error"),
        Some(&Value::from("exploded"))
    );
}

#[test]
fn and_requires_all_or_none() {
    let schema = object()
        .keys([("a", number()), ("b", number())])
        .and(["a", "b"]);
    assert!(schema.validate(Value::from(json!({}))).error.is_none());
    assert!(schema
        .validate(Value::from(json!({"a": 1, "b": 2})))
        .error
        .is_none());
    fails_with(schema.validate(Value::from(json!({"a": 1}))), "object.and");
}

#[test]
fn or_requires_at_least_one() {
    let schema = object()
        .keys([("a", number()), ("b", number())])
        .or(["a", "b"]);
    assert!(schema.validate(Value::from(json!({"b": 1}))).error.is_none());
    fails_with(schema.validate(Value::from(json!({}))), "object.missing");
}

#[test]
fn with_and_without_tie_peers_to_a_key() {
    let with = object()
        .keys([("a", number()), ("b", number())])
        .with("a", ["b"]);
    fails_with(with.validate(Value::from(json!({"a": 1}))), "object.with");
    assert!(with
        .validate(Value::from(json!({"a": 1, "b": 2})))
        .error
        .is_none());

    let without = object()
        .keys([("a", number()), ("b", number())])
        .without("a", ["b"]);
    fails_with(
        without.validate(Value::from(json!({"a": 1, "b": 2}))),
        "object.without",
    );
    assert!(without.validate(Value::from(json!({"a": 1}))).error.is_none());
}

#[test]
fn assert_checks_a_referenced_value() {
    let schema = object()
        .keys([
            ("a", object().keys([("b", number())])),
            ("c", number()),
        ])
        .assert(
            ref_("a.b"),
            models::valid([42]),
            Some("equal the answer".to_string()),
        );

    assert!(schema
        .validate(Value::from(json!({"a": {"b": 42}, "c": 1})))
        .error
        .is_none());

    let detail = fails_with(
        schema.validate(Value::from(json!({"a": {"b": 1}, "c": 1}))),
        "object.assert",
    );
    assert!(detail.message.contains("equal the answer"));
}

#[test]
fn rename_moves_keys_before_validation() {
    let schema = object()
        .keys([("b", number())])
        .rename("a", "b", RenameOptions::default());
    let result = schema.validate(Value::from(json!({"a": 1})));
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"b": 1.0}))));
}

#[test]
fn rename_conflicts_are_reported() {
    let to_existing = object()
        .keys([("b", number())])
        .unknown(true)
        .rename("a", "b", RenameOptions::default());
    fails_with(
        to_existing.validate(Value::from(json!({"a": 1, "b": 2}))),
        "object.rename.override",
    );

    let twice = object()
        .keys([("c", number())])
        .rename("a", "c", RenameOptions::default())
        .rename("b", "c", RenameOptions::default());
    fails_with(
        twice.validate(Value::from(json!({"a": 1, "b": 2}))),
        "object.rename.multiple",
    );
}

#[test]
fn absent_rename_sources_still_conflict_unless_ignored() {
    // an absent source still claims the target key
    let schema = object()
        .keys([("b", number())])
        .rename("a", "b", RenameOptions::default());
    fails_with(
        schema.validate(Value::from(json!({"b": 2}))),
        "object.rename.override",
    );

    let ignoring = object().keys([("b", number())]).rename(
        "a",
        "b",
        RenameOptions {
            ignore_undefined: true,
            ..RenameOptions::default()
        },
    );
    let result = ignoring.validate(Value::from(json!({"b": 2})));
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"b": 2.0}))));
}

#[test]
fn rename_override_and_multiple_can_be_allowed() {
    let schema = object()
        .keys([("b", number())])
        .rename(
            "a",
            "b",
            RenameOptions {
                override_existing: true,
                ..RenameOptions::default()
            },
        );
    let result = schema.validate(Value::from(json!({"a": 1, "b": 2})));
    assert!(result.error.is_none());
    assert_eq!(result.value, Some(Value::from(json!({"b": 1.0}))));
}

#[test]
fn key_count_rules() {
    fails_with(
        object()
            .min(1)
            .expect("valid limit")
            .validate(Value::from(json!({}))),
        "object.min",
    );
    fails_with(
        object()
            .max(1)
            .expect("valid limit")
            .validate(Value::from(json!({"a": 1, "b": 2}))),
        "object.max",
    );
    fails_with(
        object()
            .length(1)
            .expect("valid limit")
            .validate(Value::from(json!({}))),
        "object.length",
    );
}

#[test]
fn empty_matcher_reenters_presence_handling() {
    let schema = object().keys([(
        "a",
        string().empty("").default_value("fallback"),
    )]);
    let result = schema.validate(Value::from(json!({"a": ""})));
    assert!(result.error.is_none());
    assert_eq!(
        result.value,
        Some(Value::from(json!({"a": "fallback"})))
    );

    let required = object().keys([("a", string().empty("").required())]);
    fails_with(
        required.validate(Value::from(json!({"a": ""}))),
        "any.required",
    );
}

#[test]
fn concat_merges_children_and_keeps_explicit_strictness() {
    let merged = object()
        .keys([("a", number())])
        .concat(&object().keys([("b", string())]))
        .expect("object merge");
    assert!(merged
        .validate(Value::from(json!({"a": 1, "b": "x"})))
        .error
        .is_none());

    // permissive side merged with an explicitly strict side stays strict
    let empty: Vec<(String, models::Schema)> = Vec::new();
    let strict = object()
        .concat(&object().keys(empty))
        .expect("object merge");
    fails_with(
        strict.validate(Value::from(json!({"a": 1}))),
        "object.allowUnknown",
    );
}
