//! Runtime value model for the validation engine
//!
//! Values are a closed union richer than JSON: dates and byte strings are
//! first-class because schemas constrain them natively. "Absent" is always
//! modeled as `Option<Value>::None` by callers and is distinct from
//! [`Value::Null`].

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};
use std::fmt;

/// A runtime value submitted for validation or produced by coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null (a present value, unlike an absent key)
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (double precision, like the values it models)
    Number(f64),
    /// String value
    String(String),
    /// Byte string
    Bytes(Vec<u8>),
    /// Instant in time
    Date(DateTime<Utc>),
    /// Ordered sequence of values
    Array(Vec<Value>),
    /// Insertion-ordered mapping of string keys to values
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Name of the value's base type, as used in error contexts.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "binary",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Borrow the string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the element list, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the key mapping, if this is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Mutable key mapping, if this is an object.
    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Date content, if this is a date.
    #[must_use]
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Borrow the byte content, if this is a byte string.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The value as an integer within the safe contiguous range, if it is one.
    ///
    /// Numbers above 2^53 - 1 silently lose integer precision in the double
    /// representation, so limit rules refuse them.
    #[must_use]
    pub fn as_safe_integer(&self) -> Option<i64> {
        const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE => Some(*n as i64),
            _ => None,
        }
    }

    /// Construct a byte-string value.
    #[must_use]
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    /// Walk a split path against this value.
    ///
    /// Object segments look up keys; array segments parse as indices, with a
    /// leading `-` counting from the end. A miss at any segment returns
    /// `None` (the distinguished "absent" marker), never an error.
    #[must_use]
    pub fn lookup(&self, segments: &[String]) -> Option<&Value> {
        let mut current = self;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment.as_str())?,
                Value::Array(items) => {
                    let index = if let Some(back) = segment.strip_prefix('-') {
                        items.len().checked_sub(back.parse::<usize>().ok()?)?
                    } else {
                        segment.parse::<usize>().ok()?
                    };
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Structural equality with set-membership semantics.
///
/// Unlike `PartialEq`, `NaN` compares equal to itself so a `NaN` entry in a
/// valid/invalid set can match a `NaN` input. Dates compare by timestamp,
/// bytes by content, arrays element-wise and objects key-wise regardless of
/// insertion order.
#[must_use]
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equal(x, y)))
        }
        (Value::Date(x), Value::Date(y)) => x.timestamp_millis() == y.timestamp_millis(),
        _ => a == b,
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Value::Object(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(b) => serde_json::Value::String(BASE64.encode(b)),
            Value::Date(d) => {
                serde_json::Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&BASE64.encode(b)),
            Value::Date(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Array(items) => items.serialize(serializer),
            Value::Object(map) => map.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::String(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "{}", BASE64.encode(b)),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_round_trip() {
        let value = Value::from(json!({"a": [1, "two", null], "b": true}));
        let Some(map) = value.as_object() else {
            panic!("expected object");
        };
        assert_eq!(map.get("b"), Some(&Value::Bool(true)));
        let back = serde_json::Value::from(value.clone());
        assert_eq!(back, json!({"a": [1.0, "two", null], "b": true}));
    }

    #[test]
    fn deep_equal_handles_nan_and_dates() {
        assert!(deep_equal(
            &Value::Number(f64::NAN),
            &Value::Number(f64::NAN)
        ));
        assert!(!deep_equal(&Value::Number(0.0), &Value::Number(1.0)));

        let d = Utc::now();
        assert!(deep_equal(&Value::Date(d), &Value::Date(d)));
    }

    #[test]
    fn deep_equal_ignores_object_key_order() {
        let a = Value::from(json!({"x": 1, "y": 2}));
        let b = Value::from(json!({"y": 2, "x": 1}));
        assert!(deep_equal(&a, &b));
    }

    #[test]
    fn lookup_walks_objects_and_arrays() {
        let value = Value::from(json!({"a": {"b": [10, 20, 30]}}));
        let segments = |s: &str| s.split('.').map(String::from).collect::<Vec<_>>();

        assert_eq!(
            value.lookup(&segments("a.b.1")),
            Some(&Value::Number(20.0))
        );
        assert_eq!(
            value.lookup(&segments("a.b.-1")),
            Some(&Value::Number(30.0))
        );
        assert_eq!(value.lookup(&segments("a.c")), None);
    }

    #[test]
    fn safe_integer_bounds() {
        assert_eq!(Value::Number(12.0).as_safe_integer(), Some(12));
        assert_eq!(Value::Number(12.5).as_safe_integer(), None);
        assert_eq!(Value::Number(2f64.powi(53)).as_safe_integer(), None);
    }
}
