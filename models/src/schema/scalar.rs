//! Rule builders for the scalar kinds (string, number, date, binary)
//!
//! The size/bound rule names are shared across kinds (`min`, `max`,
//! `length`), so the builders dispatch on the node kind and validate their
//! argument for it at build time. A rejected argument (an unparsable date
//! string, an out-of-range timestamp, a fractional size) is a construction
//! error; calling a rule on a kind that does not carry it panics, like any
//! other misused builder.

use super::rules::{Bound, DateArg, Limit, Rule};
use super::{Kind, Schema};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use models_core::{ModelsError, Reference, Result};
use regex::Regex;
use std::sync::Arc;

/// Argument accepted by the limit/bound rule builders.
#[derive(Debug, Clone)]
pub enum LimitArg {
    /// A fixed number (a non-negative integer for size limits)
    Number(f64),
    /// A reference resolved at validate time
    Ref(Reference),
    /// A fixed instant (date nodes)
    Date(DateTime<Utc>),
    /// The moment of validation (date nodes)
    Now,
    /// A date string parsed at build time (date nodes)
    Text(String),
}

impl From<usize> for LimitArg {
    fn from(v: usize) -> Self {
        LimitArg::Number(v as f64)
    }
}

impl From<i32> for LimitArg {
    fn from(v: i32) -> Self {
        LimitArg::Number(f64::from(v))
    }
}

impl From<u32> for LimitArg {
    fn from(v: u32) -> Self {
        LimitArg::Number(f64::from(v))
    }
}

impl From<i64> for LimitArg {
    fn from(v: i64) -> Self {
        LimitArg::Number(v as f64)
    }
}

impl From<f64> for LimitArg {
    fn from(v: f64) -> Self {
        LimitArg::Number(v)
    }
}

impl From<Reference> for LimitArg {
    fn from(v: Reference) -> Self {
        LimitArg::Ref(v)
    }
}

impl From<DateTime<Utc>> for LimitArg {
    fn from(v: DateTime<Utc>) -> Self {
        LimitArg::Date(v)
    }
}

impl From<&str> for LimitArg {
    fn from(v: &str) -> Self {
        if v == "now" {
            LimitArg::Now
        } else {
            LimitArg::Text(v.to_string())
        }
    }
}

/// Parse the date string layouts accepted by conversion and by date rule
/// arguments: RFC 3339, RFC 2822, and the common calendar layouts, with an
/// optional trailing `UTC`/`GMT` marker.
pub(crate) fn parse_date_string(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    let bare = trimmed
        .strip_suffix(" UTC")
        .or_else(|| trimmed.strip_suffix(" GMT"))
        .unwrap_or(trimmed);

    for layout in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(bare, layout) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }
    for layout in ["%Y-%m-%d", "%m-%d-%Y", "%m/%d/%Y"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(bare, layout) {
            return Some(Utc.from_utc_datetime(&parsed.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}

fn size_limit(arg: LimitArg, rule: &'static str) -> Result<Limit> {
    match arg {
        LimitArg::Number(n) if n >= 0.0 && n.fract() == 0.0 => Ok(Limit::Count(n as usize)),
        LimitArg::Ref(r) => Ok(Limit::Ref(r)),
        _ => Err(ModelsError::rule_argument(
            rule,
            "limit must be a positive integer or reference",
        )),
    }
}

fn number_bound(arg: LimitArg, rule: &'static str) -> Result<Bound> {
    match arg {
        LimitArg::Number(n) => Ok(Bound::Number(n)),
        LimitArg::Ref(r) => Ok(Bound::Ref(r)),
        _ => Err(ModelsError::rule_argument(
            rule,
            "limit must be a number or reference",
        )),
    }
}

fn date_bound(arg: LimitArg, rule: &'static str) -> Result<DateArg> {
    match arg {
        LimitArg::Date(d) => Ok(DateArg::At(d)),
        LimitArg::Now => Ok(DateArg::Now),
        LimitArg::Ref(r) => Ok(DateArg::Ref(r)),
        LimitArg::Number(n) => Utc
            .timestamp_millis_opt(n as i64)
            .single()
            .map(DateArg::At)
            .ok_or_else(|| {
                ModelsError::rule_argument(rule, format!("{n} is out of range for a date"))
            }),
        LimitArg::Text(s) => parse_date_string(&s).map(DateArg::At).ok_or_else(|| {
            ModelsError::rule_argument(rule, format!("cannot parse \"{s}\" as a date"))
        }),
    }
}

impl Schema {
    pub(crate) fn guard(&self, allowed: &[&str], method: &str) {
        let name = self.inner.kind.name();
        assert!(
            allowed.contains(&name),
            "{method}() is not supported by {name} schemas"
        );
    }

    fn push_rule(&self, rule: Rule) -> Schema {
        self.map(|i| i.rules.push(rule))
    }

    /// Lower bound: character count, byte count, item/key count, numeric
    /// value, or date, depending on the node kind.
    ///
    /// # Errors
    ///
    /// When the argument does not fit the node kind: a fractional or
    /// negative size, an unparsable date string, an out-of-range timestamp.
    ///
    /// # Panics
    ///
    /// On node kinds without a `min` rule.
    pub fn min(&self, limit: impl Into<LimitArg>) -> Result<Schema> {
        let arg = limit.into();
        let rule = match &self.inner.kind {
            Kind::String => Rule::StringMin(size_limit(arg, "min")?),
            Kind::Binary => Rule::BinaryMin(size_limit(arg, "min")?),
            Kind::Array(_) => Rule::ArrayMin(size_limit(arg, "min")?),
            Kind::Object(_) => Rule::ObjectMin(size_limit(arg, "min")?),
            Kind::Number => Rule::NumberMin(number_bound(arg, "min")?),
            Kind::Date => Rule::DateMin(date_bound(arg, "min")?),
            other => panic!("min() is not supported by {} schemas", other.name()),
        };
        Ok(self.push_rule(rule))
    }

    /// Upper bound; argument semantics mirror [`Schema::min`].
    ///
    /// # Errors
    ///
    /// When the argument does not fit the node kind.
    ///
    /// # Panics
    ///
    /// On node kinds without a `max` rule.
    pub fn max(&self, limit: impl Into<LimitArg>) -> Result<Schema> {
        let arg = limit.into();
        let rule = match &self.inner.kind {
            Kind::String => Rule::StringMax(size_limit(arg, "max")?),
            Kind::Binary => Rule::BinaryMax(size_limit(arg, "max")?),
            Kind::Array(_) => Rule::ArrayMax(size_limit(arg, "max")?),
            Kind::Object(_) => Rule::ObjectMax(size_limit(arg, "max")?),
            Kind::Number => Rule::NumberMax(number_bound(arg, "max")?),
            Kind::Date => Rule::DateMax(date_bound(arg, "max")?),
            other => panic!("max() is not supported by {} schemas", other.name()),
        };
        Ok(self.push_rule(rule))
    }

    /// Exact size (string characters, bytes, array items, object keys).
    ///
    /// # Errors
    ///
    /// When the argument is not a positive integer or reference.
    ///
    /// # Panics
    ///
    /// On node kinds without a `length` rule.
    pub fn length(&self, limit: impl Into<LimitArg>) -> Result<Schema> {
        let arg = limit.into();
        let rule = match &self.inner.kind {
            Kind::String => Rule::StringLength(size_limit(arg, "length")?),
            Kind::Binary => Rule::BinaryLength(size_limit(arg, "length")?),
            Kind::Array(_) => Rule::ArrayLength(size_limit(arg, "length")?),
            Kind::Object(_) => Rule::ObjectLength(size_limit(arg, "length")?),
            other => panic!("length() is not supported by {} schemas", other.name()),
        };
        Ok(self.push_rule(rule))
    }

    /// Strict lower bound (number nodes).
    ///
    /// # Errors
    ///
    /// When the argument is not a number or reference.
    ///
    /// # Panics
    ///
    /// On non-number nodes.
    pub fn greater(&self, limit: impl Into<LimitArg>) -> Result<Schema> {
        self.guard(&["number"], "greater");
        let bound = number_bound(limit.into(), "greater")?;
        Ok(self.push_rule(Rule::NumberGreater(bound)))
    }

    /// Strict upper bound (number nodes).
    ///
    /// # Errors
    ///
    /// When the argument is not a number or reference.
    ///
    /// # Panics
    ///
    /// On non-number nodes.
    pub fn less(&self, limit: impl Into<LimitArg>) -> Result<Schema> {
        self.guard(&["number"], "less");
        let bound = number_bound(limit.into(), "less")?;
        Ok(self.push_rule(Rule::NumberLess(bound)))
    }

    /// Require an integer within the safe contiguous range.
    ///
    /// # Panics
    ///
    /// On non-number nodes.
    #[must_use]
    pub fn integer(&self) -> Schema {
        self.guard(&["number"], "integer");
        self.push_rule(Rule::NumberInteger)
    }

    /// Require a multiple of the given base.
    ///
    /// # Errors
    ///
    /// When the base is not a positive number or reference.
    ///
    /// # Panics
    ///
    /// On non-number nodes.
    pub fn multiple(&self, base: impl Into<LimitArg>) -> Result<Schema> {
        self.guard(&["number"], "multiple");
        let bound = number_bound(base.into(), "multiple")?;
        if let Bound::Number(n) = bound {
            if n <= 0.0 {
                return Err(ModelsError::rule_argument(
                    "multiple",
                    "base must be a positive number",
                ));
            }
        }
        Ok(self.push_rule(Rule::NumberMultiple(bound)))
    }

    /// Cap the count of decimal places; with conversion enabled the value
    /// is rounded instead of rejected.
    ///
    /// # Panics
    ///
    /// On non-number nodes.
    #[must_use]
    pub fn precision(&self, digits: u32) -> Schema {
        self.guard(&["number"], "precision");
        self.push_rule(Rule::NumberPrecision(digits))
    }

    /// Require a positive number.
    ///
    /// # Panics
    ///
    /// On non-number nodes.
    #[must_use]
    pub fn positive(&self) -> Schema {
        self.guard(&["number"], "positive");
        self.push_rule(Rule::NumberPositive)
    }

    /// Require a negative number.
    ///
    /// # Panics
    ///
    /// On non-number nodes.
    #[must_use]
    pub fn negative(&self) -> Schema {
        self.guard(&["number"], "negative");
        self.push_rule(Rule::NumberNegative)
    }

    /// Require the string to match a pattern.
    ///
    /// # Panics
    ///
    /// On non-string nodes.
    #[must_use]
    pub fn pattern(&self, pattern: Regex) -> Schema {
        self.guard(&["string"], "pattern");
        self.push_rule(Rule::StringPattern {
            pattern: Arc::new(pattern),
            name: None,
        })
    }

    /// Require a named pattern; the name is used in the failure message.
    ///
    /// # Panics
    ///
    /// On non-string nodes.
    #[must_use]
    pub fn pattern_named(&self, pattern: Regex, name: impl Into<String>) -> Schema {
        self.guard(&["string"], "pattern");
        self.push_rule(Rule::StringPattern {
            pattern: Arc::new(pattern),
            name: Some(name.into()),
        })
    }

    /// Require only ASCII alphanumeric characters.
    ///
    /// # Panics
    ///
    /// On non-string nodes.
    #[must_use]
    pub fn alphanum(&self) -> Schema {
        self.guard(&["string"], "alphanum");
        self.push_rule(Rule::StringAlphanum)
    }

    /// Require only alphanumeric and underscore characters.
    ///
    /// # Panics
    ///
    /// On non-string nodes.
    #[must_use]
    pub fn token(&self) -> Schema {
        self.guard(&["string"], "token");
        self.push_rule(Rule::StringToken)
    }

    /// Trim surrounding whitespace (converts when conversion is enabled,
    /// validates otherwise).
    ///
    /// # Panics
    ///
    /// On non-string nodes.
    #[must_use]
    pub fn trim(&self) -> Schema {
        self.guard(&["string"], "trim");
        self.push_rule(Rule::StringTrim)
    }

    /// Lowercase the string (converts when conversion is enabled, validates
    /// otherwise).
    ///
    /// # Panics
    ///
    /// On non-string nodes.
    #[must_use]
    pub fn lowercase(&self) -> Schema {
        self.guard(&["string"], "lowercase");
        self.push_rule(Rule::StringLowercase)
    }

    /// Uppercase the string (converts when conversion is enabled, validates
    /// otherwise).
    ///
    /// # Panics
    ///
    /// On non-string nodes.
    #[must_use]
    pub fn uppercase(&self) -> Schema {
        self.guard(&["string"], "uppercase");
        self.push_rule(Rule::StringUppercase)
    }
}
