//! Rule list entries
//!
//! Rules are the ordered, repeatable constraint checks of a node. Each
//! carries its argument inline; arguments that defer to sibling data are
//! held as a [`Reference`] and resolved by the executor.

use chrono::{DateTime, Utc};
use models_core::{Reference, Value};
use regex::Regex;
use std::sync::Arc;

/// A size limit: fixed count or a reference resolved at validate time.
#[derive(Debug, Clone)]
pub(crate) enum Limit {
    Count(usize),
    Ref(Reference),
}

impl Limit {
    pub(crate) fn describe(&self) -> Value {
        match self {
            Limit::Count(n) => Value::from(*n),
            Limit::Ref(r) => Value::String(r.display_path()),
        }
    }
}

/// A numeric comparison bound: fixed number or a reference.
#[derive(Debug, Clone)]
pub(crate) enum Bound {
    Number(f64),
    Ref(Reference),
}

impl Bound {
    pub(crate) fn describe(&self) -> Value {
        match self {
            Bound::Number(n) => Value::Number(*n),
            Bound::Ref(r) => Value::String(r.display_path()),
        }
    }
}

/// A date comparison bound: fixed instant, the moment of validation, or a
/// reference.
#[derive(Debug, Clone)]
pub(crate) enum DateArg {
    At(DateTime<Utc>),
    Now,
    Ref(Reference),
}

impl DateArg {
    pub(crate) fn describe(&self) -> Value {
        match self {
            DateArg::At(d) => Value::Date(*d),
            DateArg::Now => Value::String("now".to_string()),
            DateArg::Ref(r) => Value::String(r.display_path()),
        }
    }
}

/// One constraint check. Duplicate names are legal and all run.
#[derive(Clone)]
pub(crate) enum Rule {
    // string
    StringMin(Limit),
    StringMax(Limit),
    StringLength(Limit),
    StringPattern {
        pattern: Arc<Regex>,
        name: Option<String>,
    },
    StringAlphanum,
    StringToken,
    StringTrim,
    StringLowercase,
    StringUppercase,

    // number
    NumberMin(Bound),
    NumberMax(Bound),
    NumberGreater(Bound),
    NumberLess(Bound),
    NumberInteger,
    NumberMultiple(Bound),
    NumberPrecision(u32),
    NumberPositive,
    NumberNegative,

    // date
    DateMin(DateArg),
    DateMax(DateArg),

    // binary
    BinaryMin(Limit),
    BinaryMax(Limit),
    BinaryLength(Limit),

    // array
    ArrayMin(Limit),
    ArrayMax(Limit),
    ArrayLength(Limit),

    // object (key counts)
    ObjectMin(Limit),
    ObjectMax(Limit),
    ObjectLength(Limit),
}

impl Rule {
    /// Rule name as reported by describe output and error codes.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Rule::StringMin(_)
            | Rule::NumberMin(_)
            | Rule::DateMin(_)
            | Rule::BinaryMin(_)
            | Rule::ArrayMin(_)
            | Rule::ObjectMin(_) => "min",
            Rule::StringMax(_)
            | Rule::NumberMax(_)
            | Rule::DateMax(_)
            | Rule::BinaryMax(_)
            | Rule::ArrayMax(_)
            | Rule::ObjectMax(_) => "max",
            Rule::StringLength(_)
            | Rule::BinaryLength(_)
            | Rule::ArrayLength(_)
            | Rule::ObjectLength(_) => "length",
            Rule::StringPattern { .. } => "regex",
            Rule::StringAlphanum => "alphanum",
            Rule::StringToken => "token",
            Rule::StringTrim => "trim",
            Rule::StringLowercase => "lowercase",
            Rule::StringUppercase => "uppercase",
            Rule::NumberGreater(_) => "greater",
            Rule::NumberLess(_) => "less",
            Rule::NumberInteger => "integer",
            Rule::NumberMultiple(_) => "multiple",
            Rule::NumberPrecision(_) => "precision",
            Rule::NumberPositive => "positive",
            Rule::NumberNegative => "negative",
        }
    }

    /// The argument as it appears in describe output, if the rule has one.
    pub(crate) fn describe_arg(&self) -> Option<Value> {
        match self {
            Rule::StringMin(l)
            | Rule::StringMax(l)
            | Rule::StringLength(l)
            | Rule::BinaryMin(l)
            | Rule::BinaryMax(l)
            | Rule::BinaryLength(l)
            | Rule::ArrayMin(l)
            | Rule::ArrayMax(l)
            | Rule::ArrayLength(l)
            | Rule::ObjectMin(l)
            | Rule::ObjectMax(l)
            | Rule::ObjectLength(l) => Some(l.describe()),
            Rule::StringPattern { pattern, name } => {
                let mut arg = indexmap::IndexMap::new();
                arg.insert(
                    "pattern".to_string(),
                    Value::String(pattern.as_str().to_string()),
                );
                if let Some(name) = name {
                    arg.insert("name".to_string(), Value::String(name.clone()));
                }
                Some(Value::Object(arg))
            }
            Rule::NumberMin(b)
            | Rule::NumberMax(b)
            | Rule::NumberGreater(b)
            | Rule::NumberLess(b)
            | Rule::NumberMultiple(b) => Some(b.describe()),
            Rule::NumberPrecision(p) => Some(Value::from(*p)),
            Rule::DateMin(d) | Rule::DateMax(d) => Some(d.describe()),
            _ => None,
        }
    }
}
