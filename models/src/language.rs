//! Default message catalog and template rendering
//!
//! Every failure code maps to a template. Templates are prefixed with the
//! quoted node label unless they start with `!!`, and interpolate
//! `{{name}}` placeholders from the detail context (`{{!name}}` is accepted
//! as an alias; escaping is not a concern of this engine). The `language`
//! validation option overrides templates per code.

use indexmap::IndexMap;
use models_core::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Label used when a node has none.
pub(crate) const DEFAULT_LABEL: &str = "value";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{!?([a-zA-Z][a-zA-Z0-9.]*)\}\}").unwrap_or_else(|_| unreachable!())
});

static DEFAULTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("any.required", "is required");
    m.insert("any.unknown", "is not allowed");
    m.insert("any.invalid", "contains an invalid value");
    m.insert("any.empty", "is not allowed to be empty");
    m.insert("any.allowOnly", "must be one of {{valids}}");
    m.insert("any.default", "threw an error when running default method");

    m.insert(
        "alternatives.base",
        "not matching any of the allowed alternatives",
    );
    m.insert(
        "alternatives.child",
        "!!\"{{label}}\" fails because [{{reason}}]",
    );

    m.insert("array.base", "must be an array");
    m.insert(
        "array.includes",
        "at position {{pos}} does not match any of the allowed types",
    );
    m.insert(
        "array.includesSingle",
        "!!single value of \"{{label}}\" does not match any of the allowed types",
    );
    m.insert(
        "array.includesOne",
        "at position {{pos}} fails because [{{reason}}]",
    );
    m.insert(
        "array.includesOneSingle",
        "!!single value of \"{{label}}\" fails because [{{reason}}]",
    );
    m.insert(
        "array.includesRequiredUnknowns",
        "does not contain {{unknownMisses}} required value(s)",
    );
    m.insert(
        "array.includesRequiredKnowns",
        "does not contain {{knownMisses}}",
    );
    m.insert(
        "array.includesRequiredBoth",
        "does not contain {{knownMisses}} and {{unknownMisses}} other required value(s)",
    );
    m.insert("array.excludes", "at position {{pos}} contains an excluded value");
    m.insert(
        "array.excludesSingle",
        "!!single value of \"{{label}}\" contains an excluded value",
    );
    m.insert("array.min", "must contain at least {{limit}} items");
    m.insert(
        "array.max",
        "must contain less than or equal to {{limit}} items",
    );
    m.insert("array.length", "must contain {{limit}} items");
    m.insert(
        "array.ordered",
        "at position {{pos}} fails because [{{reason}}]",
    );
    m.insert(
        "array.orderedLength",
        "at position {{pos}} fails because array must contain at most {{limit}} items",
    );
    m.insert(
        "array.ref",
        "references \"{{ref}}\" which is not a positive integer",
    );
    m.insert("array.sparse", "must not be a sparse array");
    m.insert("array.unique", "position {{pos}} contains a duplicate value");

    m.insert("boolean.base", "must be a boolean");

    m.insert("binary.base", "must be a buffer or a string");
    m.insert("binary.min", "must be at least {{limit}} bytes");
    m.insert("binary.max", "must be less than or equal to {{limit}} bytes");
    m.insert("binary.length", "must be {{limit}} bytes");
    m.insert(
        "binary.ref",
        "references \"{{ref}}\" which is not a positive integer",
    );

    m.insert(
        "date.base",
        "must be a number of milliseconds or valid date string",
    );
    m.insert("date.min", "must be larger than or equal to \"{{limit}}\"");
    m.insert("date.max", "must be less than or equal to \"{{limit}}\"");
    m.insert("date.ref", "references \"{{ref}}\" which is not a date");

    m.insert("number.base", "must be a number");
    m.insert("number.min", "must be larger than or equal to {{limit}}");
    m.insert("number.max", "must be less than or equal to {{limit}}");
    m.insert("number.less", "must be less than {{limit}}");
    m.insert("number.greater", "must be greater than {{limit}}");
    m.insert("number.integer", "must be an integer");
    m.insert("number.negative", "must be a negative number");
    m.insert("number.positive", "must be a positive number");
    m.insert(
        "number.precision",
        "must have no more than {{limit}} decimal places",
    );
    m.insert("number.multiple", "must be a multiple of {{multiple}}");
    m.insert("number.ref", "references \"{{ref}}\" which is not a number");

    m.insert("object.base", "must be an object");
    m.insert("object.child", "!!child \"{{child}}\" fails because [{{reason}}]");
    m.insert("object.allowUnknown", "!!\"{{child}}\" is not allowed");
    m.insert("object.min", "must have at least {{limit}} children");
    m.insert(
        "object.max",
        "must have less than or equal to {{limit}} children",
    );
    m.insert("object.length", "must have {{limit}} children");
    m.insert(
        "object.and",
        "!!\"{{label}}\" contains {{present}} without its required peers {{missing}}",
    );
    m.insert(
        "object.missing",
        "!!\"{{label}}\" must contain at least one of {{peers}}",
    );
    m.insert(
        "object.with",
        "!!\"{{main}}\" missing required peer \"{{peer}}\"",
    );
    m.insert(
        "object.without",
        "!!\"{{main}}\" conflict with forbidden peer \"{{peer}}\"",
    );
    m.insert(
        "object.assert",
        "!!\"{{label}}\" is invalid because \"{{ref}}\" failed to {{message}}",
    );
    m.insert(
        "object.ref",
        "references \"{{ref}}\" which is not a positive integer",
    );
    m.insert(
        "object.rename.multiple",
        "!!cannot rename child \"{{from}}\" because multiple renames are disabled and another key was already renamed to \"{{to}}\"",
    );
    m.insert(
        "object.rename.override",
        "!!cannot rename child \"{{from}}\" because override is disabled and target \"{{to}}\" exists",
    );

    m.insert("string.base", "must be a string");
    m.insert(
        "string.min",
        "length must be at least {{limit}} characters long",
    );
    m.insert(
        "string.max",
        "length must be less than or equal to {{limit}} characters long",
    );
    m.insert("string.length", "length must be {{limit}} characters long");
    m.insert(
        "string.alphanum",
        "must only contain alpha-numeric characters",
    );
    m.insert(
        "string.token",
        "must only contain alpha-numeric and underscore characters",
    );
    m.insert(
        "string.regex.base",
        "with value \"{{value}}\" fails to match the required pattern: {{pattern}}",
    );
    m.insert(
        "string.regex.name",
        "with value \"{{value}}\" fails to match the {{name}} pattern",
    );
    m.insert("string.trim", "must not have leading or trailing whitespace");
    m.insert("string.lowercase", "must only contain lowercase characters");
    m.insert("string.uppercase", "must only contain uppercase characters");
    m.insert(
        "string.ref",
        "references \"{{ref}}\" which is not a positive integer",
    );

    m
});

/// Render the message for a failure code.
///
/// `extras` supplies the placeholder values, `reasons` the already-rendered
/// messages of wrapped child failures (joined for `{{reason}}`), and
/// `overrides` any `language` option templates, which take precedence over
/// the defaults.
pub(crate) fn render(
    code: &str,
    label: &str,
    extras: &IndexMap<String, Value>,
    reasons: &[String],
    overrides: Option<&IndexMap<String, String>>,
) -> String {
    let template = overrides
        .and_then(|o| o.get(code))
        .map(String::as_str)
        .or_else(|| DEFAULTS.get(code).copied());

    let Some(template) = template else {
        return format!("Error code \"{code}\" is not defined, your custom type is missing the correct language definition");
    };

    let (body, prefixed) = match template.strip_prefix("!!") {
        Some(rest) => (rest, false),
        None => (template, true),
    };

    let rendered = PLACEHOLDER.replace_all(body, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match name {
            "label" => label.to_string(),
            "reason" => reasons.join(". "),
            _ => extras
                .get(name)
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    });

    if prefixed {
        format!("\"{label}\" {rendered}")
    } else {
        rendered.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prefixes_label_unless_absolute() {
        let extras = IndexMap::new();
        assert_eq!(
            render("any.required", "value", &extras, &[], None),
            "\"value\" is required"
        );

        let mut extras = IndexMap::new();
        extras.insert("child".to_string(), Value::from("x"));
        assert_eq!(
            render("object.allowUnknown", "value", &extras, &[], None),
            "\"x\" is not allowed"
        );
    }

    #[test]
    fn interpolates_context_values() {
        let mut extras = IndexMap::new();
        extras.insert("limit".to_string(), Value::from(2));
        assert_eq!(
            render("array.min", "value", &extras, &[], None),
            "\"value\" must contain at least 2 items"
        );
    }

    #[test]
    fn joins_reasons() {
        let mut extras = IndexMap::new();
        extras.insert("child".to_string(), Value::from("a"));
        let reasons = vec!["\"a\" must be a number".to_string()];
        assert_eq!(
            render("object.child", "value", &extras, &reasons, None),
            "child \"a\" fails because [\"a\" must be a number]"
        );
    }

    #[test]
    fn override_replaces_template() {
        let mut overrides = IndexMap::new();
        overrides.insert("number.min".to_string(), "way too small".to_string());
        let extras = IndexMap::new();
        assert_eq!(
            render("number.min", "a", &extras, &[], Some(&overrides)),
            "\"a\" way too small"
        );
    }
}
