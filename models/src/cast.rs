//! Schema compilation from raw inputs
//!
//! `compile` normalizes the shorthand forms into schema nodes: a literal
//! becomes an exact-match `any`, a reference becomes an allow-listed
//! reference match, an object value becomes an `object` with its entries as
//! children, and a list becomes an implicit `alternatives` over its
//! compiled entries.

use crate::schema::{AltKind, Kind, ObjectKind, Schema};
use models_core::{Reference, Value};

/// Raw input accepted wherever a schema is expected.
#[derive(Clone)]
pub enum Raw {
    /// An already-built schema, taken as-is
    Schema(Schema),
    /// A literal value (objects become child schemas, arrays alternatives)
    Value(Value),
    /// A reference, compiled to an allow-listed match
    Ref(Reference),
    /// A list of inputs, compiled to alternatives
    List(Vec<Raw>),
}

impl Raw {
    /// Whether this input is a reference.
    #[must_use]
    pub fn is_ref(&self) -> bool {
        matches!(self, Raw::Ref(_))
    }
}

impl From<Schema> for Raw {
    fn from(s: Schema) -> Self {
        Raw::Schema(s)
    }
}

impl From<Value> for Raw {
    fn from(v: Value) -> Self {
        Raw::Value(v)
    }
}

impl From<Reference> for Raw {
    fn from(r: Reference) -> Self {
        Raw::Ref(r)
    }
}

impl From<&str> for Raw {
    fn from(v: &str) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<bool> for Raw {
    fn from(v: bool) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<i32> for Raw {
    fn from(v: i32) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<i64> for Raw {
    fn from(v: i64) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<f64> for Raw {
    fn from(v: f64) -> Self {
        Raw::Value(Value::from(v))
    }
}

impl From<Vec<Raw>> for Raw {
    fn from(items: Vec<Raw>) -> Self {
        Raw::List(items)
    }
}

impl From<Vec<Schema>> for Raw {
    fn from(items: Vec<Schema>) -> Self {
        Raw::List(items.into_iter().map(Raw::Schema).collect())
    }
}

/// Normalize a raw input into a schema node.
#[must_use]
pub fn compile(raw: Raw) -> Schema {
    match raw {
        Raw::Schema(schema) => schema,
        Raw::Ref(reference) => Schema::new(Kind::Any).valid_ref(reference),
        Raw::Value(Value::Object(map)) => {
            let children = map
                .into_iter()
                .map(|(key, value)| (key, Raw::Value(value)));
            Schema::new(Kind::Object(ObjectKind::default())).keys(children)
        }
        Raw::Value(Value::Array(items)) => {
            let branches = items.into_iter().map(|v| compile(Raw::Value(v)));
            Schema::new(Kind::Alternatives(AltKind::default())).try_(branches)
        }
        Raw::Value(literal) => Schema::new(Kind::Any).valid([literal]),
        Raw::List(items) => {
            let branches = items.into_iter().map(compile);
            Schema::new(Kind::Alternatives(AltKind::default())).try_(branches)
        }
    }
}
