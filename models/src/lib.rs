//! Composable schema description and runtime validation engine
//!
//! Schemas are built from typed nodes (`any`, `array`, `boolean`, `binary`,
//! `date`, `lazy`, `number`, `object`, `string`, `alternatives`), composed
//! with merge (`concat`) and conditional forks (`when`), and evaluated
//! against runtime values by a synchronous tree executor that produces
//! either a coerced value or a structured, path-addressed error report.
//!
//! ```
//! use models::{object, number, ref_, Value};
//!
//! let schema = object().keys([
//!     ("a", number().default_ref(ref_("b"))),
//!     ("b", models::any()),
//! ]);
//!
//! let result = schema.validate(Value::from(serde_json::json!({"b": 6})));
//! assert!(result.error.is_none());
//! ```

pub mod cast;
mod language;
pub mod schema;
pub mod validator;

pub use cast::{compile, Raw};
pub use models_core::{deep_equal, ModelsError, RefOptions, Reference, Value};
pub use schema::{Condition, LimitArg, Presence, RenameOptions, Schema, When};
pub use validator::{
    Context, Detail, Override, PathSeg, StripUnknown, Validated, ValidationError,
    ValidationOptions,
};

use schema::{AltKind, ArrayKind, BooleanKind, Kind, LazyKind, ObjectKind};
use std::sync::Arc;

/// Schema matching any value.
#[must_use]
pub fn any() -> Schema {
    Schema::new(Kind::Any)
}

/// Array schema.
#[must_use]
pub fn array() -> Schema {
    Schema::new(Kind::Array(ArrayKind::default()))
}

/// Boolean schema.
#[must_use]
pub fn boolean() -> Schema {
    Schema::new(Kind::Boolean(BooleanKind::default()))
}

/// Byte-string schema.
#[must_use]
pub fn binary() -> Schema {
    Schema::new(Kind::Binary)
}

/// Date schema.
#[must_use]
pub fn date() -> Schema {
    Schema::new(Kind::Date)
}

/// Number schema.
#[must_use]
pub fn number() -> Schema {
    Schema::new(Kind::Number)
}

/// Object schema. Without `keys()` it accepts any keys.
#[must_use]
pub fn object() -> Schema {
    Schema::new(Kind::Object(ObjectKind::default()))
}

/// String schema.
#[must_use]
pub fn string() -> Schema {
    Schema::new(Kind::String)
}

/// Alternatives schema; add branches with `try_()` or `when()`.
#[must_use]
pub fn alternatives() -> Schema {
    Schema::new(Kind::Alternatives(AltKind::default()))
}

/// Schema resolved from a thunk only when the executor visits it, enabling
/// self-referential schemas without an infinite eager tree.
#[must_use]
pub fn lazy<F>(thunk: F) -> Schema
where
    F: Fn() -> Schema + Send + Sync + 'static,
{
    Schema::new(Kind::Lazy(LazyKind {
        thunk: Arc::new(thunk),
    }))
}

/// Shorthand for `any().valid(values)`.
#[must_use]
pub fn valid<I, V>(values: I) -> Schema
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    any().valid(values)
}

/// Construct a reference with default options (`.` separator, `$` context
/// prefix).
#[must_use]
pub fn ref_(key: impl Into<String>) -> Reference {
    Reference::new(key)
}

/// Construct a reference with custom options.
#[must_use]
pub fn ref_with(key: impl Into<String>, options: RefOptions) -> Reference {
    Reference::with_options(key, options)
}

/// Whether a raw schema input is a reference.
#[must_use]
pub fn is_ref(raw: &Raw) -> bool {
    raw.is_ref()
}

/// Validate a value against a schema (or raw schema input) with default
/// options.
pub fn validate(value: impl Into<Option<Value>>, schema: impl Into<Raw>) -> Validated {
    compile(schema.into()).validate(value)
}

/// Validate with explicit options.
pub fn validate_with(
    value: impl Into<Option<Value>>,
    schema: impl Into<Raw>,
    options: &ValidationOptions,
) -> Validated {
    compile(schema.into()).validate_with(value, options)
}

/// Describe a schema (or raw schema input).
#[must_use]
pub fn describe(schema: impl Into<Raw>) -> Value {
    compile(schema.into()).describe()
}

/// Fetch the child schema at a dotted path of object keys.
#[must_use]
pub fn reach(schema: &Schema, path: &str) -> Option<Schema> {
    let mut current = schema.clone();
    if path.is_empty() {
        return Some(current);
    }
    for segment in path.split('.') {
        let next = match &current.inner.kind {
            Kind::Object(kind) => kind.children.as_ref()?.get(segment)?.clone(),
            _ => return None,
        };
        current = next;
    }
    Some(current)
}

/// Validate and return the coerced value, or the aggregate error.
pub fn attempt(
    value: impl Into<Option<Value>>,
    schema: impl Into<Raw>,
) -> Result<Option<Value>, ValidationError> {
    validate(value, schema).into_result()
}

/// Validate and fail with the aggregate error when any check fails.
pub fn assert_valid(
    value: impl Into<Option<Value>>,
    schema: impl Into<Raw>,
) -> Result<(), ValidationError> {
    attempt(value, schema).map(|_| ())
}
