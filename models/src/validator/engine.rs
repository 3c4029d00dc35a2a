//! The recursive validation executor
//!
//! One call per (schema, value) pair, threading [`State`] down the tree:
//! empty-matcher handling, presence, valid/invalid sets, conversion, rules,
//! kind-specific recursion, defaults and stripping, in that order. All
//! failures are collected as [`Detail`] trees; `abort_early` stops a
//! subtree at its first failure.

use super::errors::{self, Context, Detail, PathSeg, ValidationError};
use super::state::State;
use super::ValidationOptions;
use crate::language::{self, DEFAULT_LABEL};
use crate::schema::rules::{Bound, DateArg, Limit, Rule};
use crate::schema::{
    AltBranch, AltKind, ArrayKind, BooleanKind, BranchCondition, DefaultValue, Dependency, Kind,
    ObjectKind, Presence, Schema, SetEntry,
};
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use models_core::{deep_equal, Value};
use std::collections::HashSet;

/// Result of validating one node: the (possibly rewritten) value and the
/// node's detail tree.
pub(crate) struct Outcome {
    pub value: Option<Value>,
    pub errors: Vec<Detail>,
}

impl Outcome {
    fn ok(value: Option<Value>) -> Self {
        Outcome {
            value,
            errors: Vec::new(),
        }
    }
}

/// Per-element slot while walking an array.
enum Slot {
    Keep(Value),
    /// Element validated to an absent value
    Hole,
    /// Element matched a strip schema and is discarded
    Stripped,
}

pub(crate) struct Executor {
    /// Set when an error hook replaces the aggregate entirely.
    pub replaced: Option<ValidationError>,
}

impl Executor {
    pub fn new() -> Self {
        Executor { replaced: None }
    }

    #[allow(clippy::too_many_lines)]
    pub fn validate(
        &mut self,
        schema: &Schema,
        value: Option<Value>,
        state: &State,
        parent_opts: &ValidationOptions,
        presence_override: Option<Presence>,
        is_root: bool,
    ) -> Outcome {
        let opts = match &schema.inner.settings {
            Some(settings) => parent_opts.merged_with(settings),
            None => parent_opts.clone(),
        };

        // Lazy nodes resolve their thunk only when visited.
        if let Kind::Lazy(lazy) = &schema.inner.kind {
            let resolved = (lazy.thunk)();
            return self.validate(&resolved, value, state, &opts, presence_override, is_root);
        }

        let label = label_of(schema, state);
        let original = value.clone();
        let mut value = value;

        // A value matching the empty schema re-enters presence handling as
        // absent.
        if let (Some(matcher), Some(current)) = (&schema.inner.flags.empty, value.as_ref()) {
            let candidate = pre_trimmed(schema, current, &opts);
            if self.matches(matcher, Some(candidate), state, &opts) {
                value = None;
            }
        }

        let presence = presence_override
            .or(schema.inner.flags.presence)
            .or(opts.presence)
            .unwrap_or(Presence::Optional);

        let mut errors: Vec<Detail> = Vec::new();

        match presence {
            Presence::Ignore => return Outcome { value, errors },
            Presence::Required if value.is_none() => {
                errors.push(self.detail(
                    "any.required",
                    state,
                    &label,
                    &opts,
                    IndexMap::new(),
                    Vec::new(),
                ));
                return self.conclude(schema, None, original, errors, state, &label, is_root);
            }
            Presence::Forbidden => {
                if value.is_none() {
                    return Outcome {
                        value: None,
                        errors,
                    };
                }
                errors.push(self.detail(
                    "any.unknown",
                    state,
                    &label,
                    &opts,
                    IndexMap::new(),
                    Vec::new(),
                ));
                return self.conclude(schema, value, original, errors, state, &label, is_root);
            }
            _ => {}
        }

        let Some(val) = value else {
            return self.finalize_absent(schema, state, &label, &opts);
        };
        let mut val = val;

        let insensitive = schema.inner.flags.insensitive.unwrap_or(false);

        // Allow-listed match on the raw input short-circuits conversion and
        // rules.
        if schema
            .inner
            .valids
            .contains(&val, insensitive, state.parent(), opts.context.as_ref())
        {
            return self.conclude(schema, Some(val), original, errors, state, &label, is_root);
        }

        // Conversion (or bare type check when conversion is off).
        let was_array = matches!(val, Value::Array(_));
        match self.coerce(schema, val, &label, state, &opts) {
            Ok(converted) => val = converted,
            Err(detail) => {
                errors.push(detail);
                return self.conclude(schema, original.clone(), original, errors, state, &label, is_root);
            }
        }

        // An empty string is absence-adjacent, not a valid string value.
        if matches!(schema.inner.kind, Kind::String) {
            if let Value::String(s) = &val {
                if s.is_empty() {
                    errors.push(self.detail(
                        "any.empty",
                        state,
                        &label,
                        &opts,
                        IndexMap::new(),
                        Vec::new(),
                    ));
                    return self.conclude(schema, Some(val), original, errors, state, &label, is_root);
                }
            }
        }

        // Valid/invalid sets against the converted value; the allow-list
        // only fails after the conversion path has had its chance.
        if schema
            .inner
            .invalids
            .contains(&val, insensitive, state.parent(), opts.context.as_ref())
        {
            let mut extras = IndexMap::new();
            extras.insert("value".to_string(), val.clone());
            errors.push(self.detail("any.invalid", state, &label, &opts, extras, Vec::new()));
            if opts.abort_early() {
                return self.conclude(schema, Some(val), original, errors, state, &label, is_root);
            }
        }

        if !schema.inner.valids.is_empty() {
            if schema
                .inner
                .valids
                .contains(&val, insensitive, state.parent(), opts.context.as_ref())
            {
                return self.conclude(schema, Some(val), original, errors, state, &label, is_root);
            }
            if schema.inner.flags.allow_only == Some(true) {
                let shown: Vec<Value> = schema
                    .inner
                    .valids
                    .entries
                    .iter()
                    .map(|entry| match entry {
                        SetEntry::Literal(v) => v.clone(),
                        SetEntry::Ref(r) => r
                            .resolve(state.parent(), opts.context.as_ref())
                            .unwrap_or_else(|| Value::String(r.display_path())),
                    })
                    .collect();
                let mut extras = IndexMap::new();
                extras.insert("valids".to_string(), Value::Array(shown));
                extras.insert("value".to_string(), val.clone());
                errors.push(self.detail("any.allowOnly", state, &label, &opts, extras, Vec::new()));
                if opts.abort_early() {
                    return self.conclude(schema, Some(val), original, errors, state, &label, is_root);
                }
            }
        }

        // Rules, in declaration order.
        for rule in &schema.inner.rules {
            if let Err(detail) = self.apply_rule(rule, &mut val, state, &label, &opts) {
                errors.push(detail);
                if opts.abort_early() {
                    return self.conclude(schema, Some(val), original, errors, state, &label, is_root);
                }
            }
        }

        // Kind-specific recursion.
        match &schema.inner.kind {
            Kind::Object(kind) => {
                if let Value::Object(map) = std::mem::take(&mut val) {
                    let (map, child_errors) = self.walk_object(kind, map, state, &label, &opts);
                    val = Value::Object(map);
                    errors.extend(child_errors);
                }
            }
            Kind::Array(kind) => {
                if let Value::Array(items) = std::mem::take(&mut val) {
                    let wrapped = kind.single && !was_array;
                    let (items, child_errors) =
                        self.walk_array(kind, items, wrapped, state, &label, &opts);
                    val = Value::Array(items);
                    errors.extend(child_errors);
                }
            }
            Kind::Alternatives(kind) => {
                let outcome = self.walk_alternatives(kind, val, state, &label, &opts);
                errors.extend(outcome.errors);
                return self.conclude(schema, outcome.value, original, errors, state, &label, is_root);
            }
            _ => {}
        }

        self.conclude(schema, Some(val), original, errors, state, &label, is_root)
    }

    /// Common exit: raw-flag handling and the node-level error hook.
    #[allow(clippy::too_many_arguments)]
    fn conclude(
        &mut self,
        schema: &Schema,
        value: Option<Value>,
        original: Option<Value>,
        mut errors: Vec<Detail>,
        state: &State,
        label: &str,
        is_root: bool,
    ) -> Outcome {
        let mut value = value;
        if errors.is_empty() {
            if schema.inner.flags.raw == Some(true) {
                value = original;
            }
        } else if !is_root {
            if let Some(hook) = &schema.inner.flags.error {
                match errors::apply_hook(hook, errors.clone(), &state.path, label) {
                    Ok(rewritten) => errors = rewritten,
                    Err(replacement) => {
                        if self.replaced.is_none() {
                            self.replaced = Some(replacement);
                        }
                    }
                }
            }
        }
        Outcome { value, errors }
    }

    /// Absent optional value: apply the node's default unless the enclosing
    /// object pass defers it.
    fn finalize_absent(
        &self,
        schema: &Schema,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Outcome {
        if state.defer_defaults || opts.no_defaults() {
            return Outcome::ok(None);
        }
        match self.apply_default(schema, state.parent(), state, label, opts) {
            Ok(value) => Outcome::ok(value),
            Err(detail) => Outcome {
                value: None,
                errors: vec![detail],
            },
        }
    }

    fn apply_default(
        &self,
        schema: &Schema,
        parent: Option<&Value>,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Result<Option<Value>, Detail> {
        match &schema.inner.flags.default {
            None => Ok(None),
            Some(DefaultValue::Literal(v)) => Ok(Some(v.clone())),
            Some(DefaultValue::Ref(r)) => Ok(r.resolve(parent, opts.context.as_ref())),
            Some(DefaultValue::Func { f, .. }) => match f(parent) {
                Ok(v) => Ok(Some(v)),
                Err(message) => {
                    let mut extras = IndexMap::new();
                    extras.insert("error".to_string(), Value::String(message));
                    Err(self.detail("any.default", state, label, opts, extras, Vec::new()))
                }
            },
        }
    }

    /// Quiet predicate check: does the value satisfy the schema?
    fn matches(
        &self,
        schema: &Schema,
        value: Option<Value>,
        state: &State,
        opts: &ValidationOptions,
    ) -> bool {
        let mut sub = Executor::new();
        let mut quiet = opts.clone();
        quiet.abort_early = Some(true);
        sub.validate(schema, value, state, &quiet, None, false)
            .errors
            .is_empty()
    }

    /// Quiet check ignoring the schema's own presence flag (used to test
    /// whether a value would match a `forbidden()` exclusion schema).
    fn matches_ignoring_presence(
        &self,
        schema: &Schema,
        value: Option<Value>,
        state: &State,
        opts: &ValidationOptions,
    ) -> bool {
        let mut sub = Executor::new();
        let mut quiet = opts.clone();
        quiet.abort_early = Some(true);
        sub.validate(schema, value, state, &quiet, Some(Presence::Optional), false)
            .errors
            .is_empty()
    }

    fn detail(
        &self,
        code: &str,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
        extras: IndexMap<String, Value>,
        reason: Vec<Detail>,
    ) -> Detail {
        self.detail_at(code, state.path.clone(), label, opts, extras, reason)
    }

    fn detail_at(
        &self,
        code: &str,
        path: Vec<PathSeg>,
        label: &str,
        opts: &ValidationOptions,
        extras: IndexMap<String, Value>,
        reason: Vec<Detail>,
    ) -> Detail {
        let reasons: Vec<String> = reason.iter().map(|d| d.message.clone()).collect();
        let message = language::render(code, label, &extras, &reasons, opts.language.as_ref());
        Detail {
            message,
            code: code.to_string(),
            context: Context {
                label: label.to_string(),
                key: path.last().map(PathSeg::to_value),
                extras,
                reason,
            },
            path,
            message_only: false,
        }
    }

    fn base_error(
        &self,
        kind: &str,
        value: &Value,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Detail {
        let mut extras = IndexMap::new();
        extras.insert("value".to_string(), value.clone());
        self.detail(
            &format!("{kind}.base"),
            state,
            label,
            opts,
            extras,
            Vec::new(),
        )
    }

    /// Type coercion (with `convert`) or bare type checking (without).
    fn coerce(
        &self,
        schema: &Schema,
        value: Value,
        label: &str,
        state: &State,
        opts: &ValidationOptions,
    ) -> Result<Value, Detail> {
        let convert = opts.convert();
        match &schema.inner.kind {
            Kind::Any | Kind::Lazy(_) | Kind::Alternatives(_) => Ok(value),

            Kind::String => match value {
                Value::String(_) => Ok(value),
                other => Err(self.base_error("string", &other, state, label, opts)),
            },

            Kind::Number => match value {
                Value::Number(n) if n.is_finite() => Ok(Value::Number(n)),
                Value::String(ref s) if convert => {
                    let trimmed = s.trim();
                    match trimmed.parse::<f64>() {
                        Ok(n) if n.is_finite() && !trimmed.is_empty() => Ok(Value::Number(n)),
                        _ => Err(self.base_error("number", &value, state, label, opts)),
                    }
                }
                other => Err(self.base_error("number", &other, state, label, opts)),
            },

            Kind::Boolean(tables) => self.coerce_boolean(schema, tables, value, label, state, opts),

            Kind::Date => match value {
                Value::Date(_) => Ok(value),
                Value::Number(ms) if convert => Utc
                    .timestamp_millis_opt(ms as i64)
                    .single()
                    .map(Value::Date)
                    .ok_or_else(|| self.base_error("date", &Value::Number(ms), state, label, opts)),
                Value::String(ref s) if convert => crate::schema::parse_date_string(s)
                    .map(Value::Date)
                    .ok_or_else(|| self.base_error("date", &value, state, label, opts)),
                other => Err(self.base_error("date", &other, state, label, opts)),
            },

            Kind::Binary => match value {
                Value::Bytes(_) => Ok(value),
                Value::String(s) if convert => Ok(Value::Bytes(s.into_bytes())),
                other => Err(self.base_error("binary", &other, state, label, opts)),
            },

            Kind::Object(_) => match value {
                Value::Object(_) => Ok(value),
                Value::String(ref s) if convert => match serde_json::from_str::<serde_json::Value>(s)
                {
                    Ok(parsed @ serde_json::Value::Object(_)) => Ok(Value::from(parsed)),
                    _ => Err(self.base_error("object", &value, state, label, opts)),
                },
                other => Err(self.base_error("object", &other, state, label, opts)),
            },

            Kind::Array(kind) => match value {
                Value::Array(_) => Ok(value),
                Value::String(ref s) if convert && s.trim_start().starts_with('[') => {
                    match serde_json::from_str::<serde_json::Value>(s) {
                        Ok(parsed @ serde_json::Value::Array(_)) => Ok(Value::from(parsed)),
                        _ => Err(self.base_error("array", &value, state, label, opts)),
                    }
                }
                other if kind.single => Ok(Value::Array(vec![other])),
                other => Err(self.base_error("array", &other, state, label, opts)),
            },
        }
    }

    fn coerce_boolean(
        &self,
        schema: &Schema,
        tables: &BooleanKind,
        value: Value,
        label: &str,
        state: &State,
        opts: &ValidationOptions,
    ) -> Result<Value, Detail> {
        if matches!(value, Value::Bool(_)) {
            return Ok(value);
        }
        if !opts.convert() {
            return Err(self.base_error("boolean", &value, state, label, opts));
        }

        let insensitive = schema.inner.flags.insensitive.unwrap_or(false);
        let matches_entry = |entries: &[Value]| {
            entries.iter().any(|entry| {
                if insensitive {
                    if let (Value::String(a), Value::String(b)) = (entry, &value) {
                        return a.eq_ignore_ascii_case(b);
                    }
                }
                deep_equal(entry, &value)
            })
        };

        if matches_entry(&tables.truthy) {
            return Ok(Value::Bool(true));
        }
        if matches_entry(&tables.falsy) {
            return Ok(Value::Bool(false));
        }
        if let Value::String(s) = &value {
            let lowered = if insensitive {
                s.to_ascii_lowercase()
            } else {
                s.clone()
            };
            match lowered.as_str() {
                "true" => return Ok(Value::Bool(true)),
                "false" => return Ok(Value::Bool(false)),
                _ => {}
            }
        }
        Err(self.base_error("boolean", &value, state, label, opts))
    }

    fn limit_of(
        &self,
        limit: &Limit,
        state: &State,
        opts: &ValidationOptions,
    ) -> Result<usize, String> {
        match limit {
            Limit::Count(n) => Ok(*n),
            Limit::Ref(r) => {
                let resolved = r.resolve(state.parent(), opts.context.as_ref());
                match resolved.as_ref().and_then(Value::as_safe_integer) {
                    Some(n) if n >= 0 => Ok(n as usize),
                    _ => Err(r.key().to_string()),
                }
            }
        }
    }

    fn bound_of(
        &self,
        bound: &Bound,
        state: &State,
        opts: &ValidationOptions,
    ) -> Result<f64, String> {
        match bound {
            Bound::Number(n) => Ok(*n),
            Bound::Ref(r) => {
                let resolved = r.resolve(state.parent(), opts.context.as_ref());
                match resolved.as_ref().and_then(Value::as_f64) {
                    Some(n) if n.is_finite() => Ok(n),
                    _ => Err(r.key().to_string()),
                }
            }
        }
    }

    fn date_of(
        &self,
        arg: &DateArg,
        state: &State,
        opts: &ValidationOptions,
    ) -> Result<DateTime<Utc>, String> {
        match arg {
            DateArg::At(d) => Ok(*d),
            DateArg::Now => Ok(Utc::now()),
            DateArg::Ref(r) => {
                let resolved = r.resolve(state.parent(), opts.context.as_ref());
                let date = match resolved {
                    Some(Value::Date(d)) => Some(d),
                    Some(Value::Number(ms)) => Utc.timestamp_millis_opt(ms as i64).single(),
                    Some(Value::String(s)) => crate::schema::parse_date_string(&s),
                    _ => None,
                };
                date.ok_or_else(|| r.key().to_string())
            }
        }
    }

    fn ref_failure(
        &self,
        kind: &str,
        reference: String,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Detail {
        let mut extras = IndexMap::new();
        extras.insert("ref".to_string(), Value::String(reference));
        self.detail(&format!("{kind}.ref"), state, label, opts, extras, Vec::new())
    }

    #[allow(clippy::too_many_arguments)]
    fn size_rule(
        &self,
        kind: &str,
        rule: &'static str,
        actual: usize,
        limit: &Limit,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
        value: &Value,
    ) -> Result<(), Detail> {
        let limit = match self.limit_of(limit, state, opts) {
            Ok(n) => n,
            Err(reference) => return Err(self.ref_failure(kind, reference, state, label, opts)),
        };
        let pass = match rule {
            "min" => actual >= limit,
            "max" => actual <= limit,
            _ => actual == limit,
        };
        if pass {
            return Ok(());
        }
        let mut extras = IndexMap::new();
        extras.insert("limit".to_string(), Value::from(limit));
        extras.insert("value".to_string(), value.clone());
        Err(self.detail(
            &format!("{kind}.{rule}"),
            state,
            label,
            opts,
            extras,
            Vec::new(),
        ))
    }

    #[allow(clippy::too_many_lines)]
    fn apply_rule(
        &self,
        rule: &Rule,
        val: &mut Value,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Result<(), Detail> {
        let string_len = |v: &Value| v.as_str().map(|s| s.chars().count());
        match rule {
            Rule::StringMin(limit) => {
                let len = string_len(val).unwrap_or(0);
                self.size_rule("string", "min", len, limit, state, label, opts, val)
            }
            Rule::StringMax(limit) => {
                let len = string_len(val).unwrap_or(0);
                self.size_rule("string", "max", len, limit, state, label, opts, val)
            }
            Rule::StringLength(limit) => {
                let len = string_len(val).unwrap_or(0);
                self.size_rule("string", "length", len, limit, state, label, opts, val)
            }
            Rule::StringPattern { pattern, name } => {
                let Some(s) = val.as_str() else { return Ok(()) };
                if pattern.is_match(s) {
                    return Ok(());
                }
                let mut extras = IndexMap::new();
                extras.insert("value".to_string(), val.clone());
                let code = if let Some(name) = name {
                    extras.insert("name".to_string(), Value::String(name.clone()));
                    "string.regex.name"
                } else {
                    extras.insert(
                        "pattern".to_string(),
                        Value::String(pattern.as_str().to_string()),
                    );
                    "string.regex.base"
                };
                Err(self.detail(code, state, label, opts, extras, Vec::new()))
            }
            Rule::StringAlphanum => {
                let ok = val
                    .as_str()
                    .is_some_and(|s| s.chars().all(|c| c.is_ascii_alphanumeric()));
                if ok {
                    Ok(())
                } else {
                    Err(self.simple_rule_error("string.alphanum", val, state, label, opts))
                }
            }
            Rule::StringToken => {
                let ok = val
                    .as_str()
                    .is_some_and(|s| s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
                if ok {
                    Ok(())
                } else {
                    Err(self.simple_rule_error("string.token", val, state, label, opts))
                }
            }
            Rule::StringTrim => {
                let Some(s) = val.as_str() else { return Ok(()) };
                let trimmed = s.trim();
                if trimmed == s {
                    return Ok(());
                }
                if opts.convert() {
                    *val = Value::String(trimmed.to_string());
                    Ok(())
                } else {
                    Err(self.simple_rule_error("string.trim", val, state, label, opts))
                }
            }
            Rule::StringLowercase => {
                let Some(s) = val.as_str() else { return Ok(()) };
                let lowered = s.to_lowercase();
                if lowered == s {
                    return Ok(());
                }
                if opts.convert() {
                    *val = Value::String(lowered);
                    Ok(())
                } else {
                    Err(self.simple_rule_error("string.lowercase", val, state, label, opts))
                }
            }
            Rule::StringUppercase => {
                let Some(s) = val.as_str() else { return Ok(()) };
                let raised = s.to_uppercase();
                if raised == s {
                    return Ok(());
                }
                if opts.convert() {
                    *val = Value::String(raised);
                    Ok(())
                } else {
                    Err(self.simple_rule_error("string.uppercase", val, state, label, opts))
                }
            }

            Rule::NumberMin(bound) => self.number_compare("min", bound, val, state, label, opts),
            Rule::NumberMax(bound) => self.number_compare("max", bound, val, state, label, opts),
            Rule::NumberGreater(bound) => {
                self.number_compare("greater", bound, val, state, label, opts)
            }
            Rule::NumberLess(bound) => self.number_compare("less", bound, val, state, label, opts),
            Rule::NumberInteger => {
                if val.as_safe_integer().is_some() {
                    Ok(())
                } else {
                    Err(self.simple_rule_error("number.integer", val, state, label, opts))
                }
            }
            Rule::NumberMultiple(bound) => {
                let base = match self.bound_of(bound, state, opts) {
                    Ok(n) => n,
                    Err(reference) => {
                        return Err(self.ref_failure("number", reference, state, label, opts))
                    }
                };
                let n = val.as_f64().unwrap_or(f64::NAN);
                if n % base == 0.0 {
                    Ok(())
                } else {
                    let mut extras = IndexMap::new();
                    extras.insert("multiple".to_string(), Value::Number(base));
                    extras.insert("value".to_string(), val.clone());
                    Err(self.detail("number.multiple", state, label, opts, extras, Vec::new()))
                }
            }
            Rule::NumberPrecision(digits) => {
                let n = val.as_f64().unwrap_or(f64::NAN);
                let factor = 10f64.powi(*digits as i32);
                let scaled = n * factor;
                if (scaled - scaled.round()).abs() < f64::EPSILON * scaled.abs().max(1.0) {
                    return Ok(());
                }
                if opts.convert() {
                    *val = Value::Number(scaled.round() / factor);
                    Ok(())
                } else {
                    let mut extras = IndexMap::new();
                    extras.insert("limit".to_string(), Value::from(*digits));
                    extras.insert("value".to_string(), val.clone());
                    Err(self.detail("number.precision", state, label, opts, extras, Vec::new()))
                }
            }
            Rule::NumberPositive => {
                if val.as_f64().is_some_and(|n| n > 0.0) {
                    Ok(())
                } else {
                    Err(self.simple_rule_error("number.positive", val, state, label, opts))
                }
            }
            Rule::NumberNegative => {
                if val.as_f64().is_some_and(|n| n < 0.0) {
                    Ok(())
                } else {
                    Err(self.simple_rule_error("number.negative", val, state, label, opts))
                }
            }

            Rule::DateMin(arg) => self.date_compare("min", arg, val, state, label, opts),
            Rule::DateMax(arg) => self.date_compare("max", arg, val, state, label, opts),

            Rule::BinaryMin(limit) => {
                let len = val.as_bytes().map_or(0, <[u8]>::len);
                self.size_rule("binary", "min", len, limit, state, label, opts, val)
            }
            Rule::BinaryMax(limit) => {
                let len = val.as_bytes().map_or(0, <[u8]>::len);
                self.size_rule("binary", "max", len, limit, state, label, opts, val)
            }
            Rule::BinaryLength(limit) => {
                let len = val.as_bytes().map_or(0, <[u8]>::len);
                self.size_rule("binary", "length", len, limit, state, label, opts, val)
            }

            Rule::ArrayMin(limit) => {
                let len = val.as_array().map_or(0, Vec::len);
                self.size_rule("array", "min", len, limit, state, label, opts, val)
            }
            Rule::ArrayMax(limit) => {
                let len = val.as_array().map_or(0, Vec::len);
                self.size_rule("array", "max", len, limit, state, label, opts, val)
            }
            Rule::ArrayLength(limit) => {
                let len = val.as_array().map_or(0, Vec::len);
                self.size_rule("array", "length", len, limit, state, label, opts, val)
            }

            Rule::ObjectMin(limit) => {
                let len = val.as_object().map_or(0, IndexMap::len);
                self.size_rule("object", "min", len, limit, state, label, opts, val)
            }
            Rule::ObjectMax(limit) => {
                let len = val.as_object().map_or(0, IndexMap::len);
                self.size_rule("object", "max", len, limit, state, label, opts, val)
            }
            Rule::ObjectLength(limit) => {
                let len = val.as_object().map_or(0, IndexMap::len);
                self.size_rule("object", "length", len, limit, state, label, opts, val)
            }
        }
    }

    fn simple_rule_error(
        &self,
        code: &str,
        val: &Value,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Detail {
        let mut extras = IndexMap::new();
        extras.insert("value".to_string(), val.clone());
        self.detail(code, state, label, opts, extras, Vec::new())
    }

    fn number_compare(
        &self,
        rule: &'static str,
        bound: &Bound,
        val: &Value,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Result<(), Detail> {
        let limit = match self.bound_of(bound, state, opts) {
            Ok(n) => n,
            Err(reference) => return Err(self.ref_failure("number", reference, state, label, opts)),
        };
        let n = val.as_f64().unwrap_or(f64::NAN);
        let pass = match rule {
            "min" => n >= limit,
            "max" => n <= limit,
            "greater" => n > limit,
            _ => n < limit,
        };
        if pass {
            return Ok(());
        }
        let mut extras = IndexMap::new();
        extras.insert("limit".to_string(), Value::Number(limit));
        extras.insert("value".to_string(), val.clone());
        Err(self.detail(
            &format!("number.{rule}"),
            state,
            label,
            opts,
            extras,
            Vec::new(),
        ))
    }

    fn date_compare(
        &self,
        rule: &'static str,
        arg: &DateArg,
        val: &Value,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Result<(), Detail> {
        let limit = match self.date_of(arg, state, opts) {
            Ok(d) => d,
            Err(reference) => return Err(self.ref_failure("date", reference, state, label, opts)),
        };
        let Some(date) = val.as_date() else {
            return Ok(());
        };
        let pass = match rule {
            "min" => date >= limit,
            _ => date <= limit,
        };
        if pass {
            return Ok(());
        }
        let mut extras = IndexMap::new();
        extras.insert("limit".to_string(), Value::Date(limit));
        extras.insert("value".to_string(), val.clone());
        Err(self.detail(
            &format!("date.{rule}"),
            state,
            label,
            opts,
            extras,
            Vec::new(),
        ))
    }

    /// Object recursion: renames, child validation, unknown-key policy,
    /// two-pass defaults, and dependency checks.
    fn walk_object(
        &mut self,
        kind: &ObjectKind,
        map: IndexMap<String, Value>,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> (IndexMap<String, Value>, Vec<Detail>) {
        let mut working = map;
        let mut errors: Vec<Detail> = Vec::new();

        // Renames run before any child validation. An absent source still
        // participates in conflict bookkeeping (and clears the target)
        // unless the rename ignores undefined sources.
        let mut renamed_to: HashSet<String> = HashSet::new();
        for rename in &kind.renames {
            let source = working.get(&rename.from).cloned();
            if rename.ignore_undefined && source.is_none() {
                continue;
            }
            let rename_extras = || {
                let mut extras = IndexMap::new();
                extras.insert("from".to_string(), Value::String(rename.from.clone()));
                extras.insert("to".to_string(), Value::String(rename.to.clone()));
                extras
            };

            if !rename.multiple && renamed_to.contains(&rename.to) {
                errors.push(self.detail(
                    "object.rename.multiple",
                    state,
                    label,
                    opts,
                    rename_extras(),
                    Vec::new(),
                ));
                if opts.abort_early() {
                    return (working, errors);
                }
            }
            if working.contains_key(&rename.to)
                && !rename.override_target
                && !renamed_to.contains(&rename.to)
            {
                errors.push(self.detail(
                    "object.rename.override",
                    state,
                    label,
                    opts,
                    rename_extras(),
                    Vec::new(),
                ));
                if opts.abort_early() {
                    return (working, errors);
                }
            }

            match source {
                Some(moved) => {
                    working.insert(rename.to.clone(), moved);
                }
                None => {
                    working.shift_remove(&rename.to);
                }
            }
            renamed_to.insert(rename.to.clone());
            if !rename.alias {
                working.shift_remove(&rename.from);
            }
        }

        if let Some(children) = &kind.children {
            for (key, child) in children {
                let child_value = working.get(key).cloned();
                let child_state = state.for_key(key, Value::Object(working.clone()));
                let outcome = self.validate(child, child_value, &child_state, opts, None, false);

                if outcome.errors.is_empty() {
                    match outcome.value {
                        Some(v) => {
                            if child.inner.flags.strip == Some(true) {
                                working.shift_remove(key);
                            } else {
                                working.insert(key.clone(), v);
                            }
                        }
                        None => {
                            working.shift_remove(key);
                        }
                    }
                } else {
                    let mut extras = IndexMap::new();
                    extras.insert("child".to_string(), Value::String(key.clone()));
                    errors.push(self.detail_at(
                        "object.child",
                        child_state.path.clone(),
                        label,
                        opts,
                        extras,
                        outcome.errors,
                    ));
                    if opts.abort_early() {
                        return (working, errors);
                    }
                }
            }

            // Unknown keys: strip, allow, or fail.
            let unknown: Vec<String> = working
                .keys()
                .filter(|k| !children.contains_key(*k))
                .cloned()
                .collect();
            for key in unknown {
                if opts.strip_unknown_objects() {
                    working.shift_remove(&key);
                } else if !opts.allow_unknown() {
                    let mut path = state.path.clone();
                    path.push(PathSeg::Key(key.clone()));
                    let mut extras = IndexMap::new();
                    extras.insert("child".to_string(), Value::String(key.clone()));
                    errors.push(self.detail_at(
                        "object.allowUnknown",
                        path,
                        &key,
                        opts,
                        extras,
                        Vec::new(),
                    ));
                    if opts.abort_early() {
                        return (working, errors);
                    }
                }
            }

            // Two-pass defaults: plain defaults first, then reference
            // defaults against the post-validation siblings, so key
            // declaration order never matters.
            if !opts.no_defaults() {
                for (key, child) in children {
                    if working.contains_key(key)
                        || child.inner.flags.strip == Some(true)
                        || matches!(child.inner.flags.default, None | Some(DefaultValue::Ref(_)))
                    {
                        continue;
                    }
                    let parent_value = Value::Object(working.clone());
                    let child_state = state.for_key(key, parent_value.clone());
                    let child_label = label_of(child, &child_state);
                    match self.apply_default(child, Some(&parent_value), &child_state, &child_label, opts)
                    {
                        Ok(Some(v)) => {
                            working.insert(key.clone(), v);
                        }
                        Ok(None) => {}
                        Err(detail) => {
                            let mut extras = IndexMap::new();
                            extras.insert("child".to_string(), Value::String(key.clone()));
                            errors.push(self.detail_at(
                                "object.child",
                                child_state.path.clone(),
                                label,
                                opts,
                                extras,
                                vec![detail],
                            ));
                            if opts.abort_early() {
                                return (working, errors);
                            }
                        }
                    }
                }
                for (key, child) in children {
                    if working.contains_key(key)
                        || !matches!(child.inner.flags.default, Some(DefaultValue::Ref(_)))
                    {
                        continue;
                    }
                    let parent_value = Value::Object(working.clone());
                    let child_state = state.for_key(key, parent_value.clone());
                    let child_label = label_of(child, &child_state);
                    if let Ok(Some(v)) =
                        self.apply_default(child, Some(&parent_value), &child_state, &child_label, opts)
                    {
                        working.insert(key.clone(), v);
                    }
                }
            }
        }

        // Dependencies run against the post-validation keys.
        for dependency in &kind.dependencies {
            if let Some(detail) = self.check_dependency(dependency, &working, state, label, opts) {
                errors.push(detail);
                if opts.abort_early() {
                    return (working, errors);
                }
            }
        }

        (working, errors)
    }

    fn check_dependency(
        &self,
        dependency: &Dependency,
        working: &IndexMap<String, Value>,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Option<Detail> {
        let present = |key: &String| working.contains_key(key.as_str());
        match dependency {
            Dependency::And(peers) => {
                let (have, missing): (Vec<&String>, Vec<&String>) =
                    peers.iter().partition(|p| present(p));
                if have.is_empty() || missing.is_empty() {
                    return None;
                }
                let mut extras = IndexMap::new();
                extras.insert(
                    "present".to_string(),
                    Value::Array(have.iter().map(|s| Value::String((*s).clone())).collect()),
                );
                extras.insert(
                    "missing".to_string(),
                    Value::Array(missing.iter().map(|s| Value::String((*s).clone())).collect()),
                );
                Some(self.detail("object.and", state, label, opts, extras, Vec::new()))
            }
            Dependency::Or(peers) => {
                if peers.iter().any(present) {
                    return None;
                }
                let mut extras = IndexMap::new();
                extras.insert(
                    "peers".to_string(),
                    Value::Array(peers.iter().map(|s| Value::String(s.clone())).collect()),
                );
                Some(self.detail("object.missing", state, label, opts, extras, Vec::new()))
            }
            Dependency::With { key, peers } => {
                if !working.contains_key(key.as_str()) {
                    return None;
                }
                let missing = peers.iter().find(|p| !present(p))?;
                let mut extras = IndexMap::new();
                extras.insert("main".to_string(), Value::String(key.clone()));
                extras.insert("peer".to_string(), Value::String(missing.clone()));
                Some(self.detail("object.with", state, label, opts, extras, Vec::new()))
            }
            Dependency::Without { key, peers } => {
                if !working.contains_key(key.as_str()) {
                    return None;
                }
                let conflicting = peers.iter().find(|p| present(p))?;
                let mut extras = IndexMap::new();
                extras.insert("main".to_string(), Value::String(key.clone()));
                extras.insert("peer".to_string(), Value::String(conflicting.clone()));
                Some(self.detail("object.without", state, label, opts, extras, Vec::new()))
            }
            Dependency::Assert {
                reference,
                schema,
                message,
            } => {
                let target = Value::Object(working.clone());
                let resolved = reference.resolve(Some(&target), opts.context.as_ref());
                if self.matches(schema, resolved, state, opts) {
                    return None;
                }
                let mut extras = IndexMap::new();
                extras.insert("ref".to_string(), Value::String(reference.key().to_string()));
                extras.insert(
                    "message".to_string(),
                    Value::String(
                        message
                            .clone()
                            .unwrap_or_else(|| "pass the assertion test".to_string()),
                    ),
                );
                Some(self.detail("object.assert", state, label, opts, extras, Vec::new()))
            }
        }
    }

    /// Array recursion: exclusions, ordered tuple, required tracking,
    /// inclusion matching, sparse policy and uniqueness.
    #[allow(clippy::too_many_lines)]
    fn walk_array(
        &mut self,
        kind: &ArrayKind,
        items: Vec<Value>,
        wrapped: bool,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> (Vec<Value>, Vec<Detail>) {
        let mut errors: Vec<Detail> = Vec::new();
        let mut slots: Vec<Slot> = Vec::with_capacity(items.len());

        let is_forbidden =
            |s: &Schema| s.inner.flags.presence == Some(Presence::Forbidden);
        let is_required = |s: &Schema| s.inner.flags.presence == Some(Presence::Required);

        let exclusions: Vec<&Schema> = kind.items.iter().filter(|s| is_forbidden(s)).collect();
        let inclusions: Vec<&Schema> = kind.items.iter().filter(|s| !is_forbidden(s)).collect();
        let mut pending: Vec<&Schema> = inclusions
            .iter()
            .copied()
            .filter(|s| is_required(s))
            .collect();

        let finish = |slots: Vec<Slot>| -> Vec<Value> {
            slots
                .into_iter()
                .filter_map(|slot| match slot {
                    Slot::Keep(v) => Some(v),
                    Slot::Hole => Some(Value::Null),
                    Slot::Stripped => None,
                })
                .collect()
        };

        'elements: for (pos, element) in items.into_iter().enumerate() {
            let el_state = state.for_index(pos);

            for exclusion in &exclusions {
                if self.matches_ignoring_presence(exclusion, Some(element.clone()), &el_state, opts)
                {
                    let code = if wrapped {
                        "array.excludesSingle"
                    } else {
                        "array.excludes"
                    };
                    let mut extras = IndexMap::new();
                    extras.insert("pos".to_string(), Value::from(pos));
                    extras.insert("value".to_string(), element.clone());
                    errors.push(self.detail_at(
                        code,
                        el_state.path.clone(),
                        label,
                        opts,
                        extras,
                        Vec::new(),
                    ));
                    if opts.abort_early() {
                        return (finish(slots), errors);
                    }
                    slots.push(Slot::Keep(element));
                    continue 'elements;
                }
            }

            if pos < kind.ordered.len() {
                let schema = &kind.ordered[pos];
                let outcome = self.validate(schema, Some(element), &el_state, opts, None, false);
                if outcome.errors.is_empty() {
                    if schema.inner.flags.strip == Some(true) {
                        slots.push(Slot::Stripped);
                    } else {
                        match outcome.value {
                            Some(v) => slots.push(Slot::Keep(v)),
                            None => slots.push(Slot::Hole),
                        }
                    }
                } else {
                    let mut extras = IndexMap::new();
                    extras.insert("pos".to_string(), Value::from(pos));
                    errors.push(self.detail_at(
                        "array.ordered",
                        el_state.path.clone(),
                        label,
                        opts,
                        extras,
                        outcome.errors,
                    ));
                    if opts.abort_early() {
                        return (finish(slots), errors);
                    }
                    slots.push(Slot::Hole);
                }
                continue;
            }

            if !kind.ordered.is_empty() && inclusions.is_empty() {
                let mut extras = IndexMap::new();
                extras.insert("pos".to_string(), Value::from(pos));
                extras.insert("limit".to_string(), Value::from(kind.ordered.len()));
                errors.push(self.detail_at(
                    "array.orderedLength",
                    el_state.path.clone(),
                    label,
                    opts,
                    extras,
                    Vec::new(),
                ));
                if opts.abort_early() {
                    return (finish(slots), errors);
                }
                slots.push(Slot::Keep(element));
                continue;
            }

            if inclusions.is_empty() {
                slots.push(Slot::Keep(element));
                continue;
            }

            // Pending required schemas take the element first, so duplicate
            // requirements each consume their own match.
            let mut first_attempt: Option<Vec<Detail>> = None;
            let mut matched: Option<(Slot, Option<usize>)> = None;
            for (at, required) in pending.iter().enumerate() {
                let outcome =
                    self.validate(required, Some(element.clone()), &el_state, opts, None, false);
                if outcome.errors.is_empty() {
                    matched = Some((slot_for(required, outcome.value), Some(at)));
                    break;
                }
                if first_attempt.is_none() {
                    first_attempt = Some(outcome.errors);
                }
            }
            if matched.is_none() {
                for schema in &inclusions {
                    let outcome =
                        self.validate(schema, Some(element.clone()), &el_state, opts, None, false);
                    if outcome.errors.is_empty() {
                        matched = Some((slot_for(schema, outcome.value), None));
                        break;
                    }
                    if first_attempt.is_none() {
                        first_attempt = Some(outcome.errors);
                    }
                }
            }
            if let Some((slot, consumed)) = matched {
                if let Some(at) = consumed {
                    pending.remove(at);
                }
                slots.push(slot);
                continue 'elements;
            }

            // No inclusion matched this element.
            if opts.strip_unknown_arrays() {
                slots.push(Slot::Stripped);
                continue;
            }
            let mut extras = IndexMap::new();
            extras.insert("pos".to_string(), Value::from(pos));
            extras.insert("value".to_string(), element.clone());
            let detail = if inclusions.len() == 1 {
                let code = if wrapped {
                    "array.includesOneSingle"
                } else {
                    "array.includesOne"
                };
                self.detail_at(
                    code,
                    el_state.path.clone(),
                    label,
                    opts,
                    extras,
                    first_attempt.unwrap_or_default(),
                )
            } else {
                let code = if wrapped {
                    "array.includesSingle"
                } else {
                    "array.includes"
                };
                self.detail_at(code, el_state.path.clone(), label, opts, extras, Vec::new())
            };
            errors.push(detail);
            if opts.abort_early() {
                return (finish(slots), errors);
            }
            slots.push(Slot::Keep(element));
        }

        // Required schemas not consumed by any element.
        if !pending.is_empty() {
            let known: Vec<Value> = pending
                .iter()
                .filter_map(|s| s.inner.flags.label.clone())
                .map(Value::String)
                .collect();
            let unknown = pending.len() - known.len();
            let mut extras = IndexMap::new();
            let code = if !known.is_empty() && unknown > 0 {
                extras.insert("knownMisses".to_string(), Value::Array(known));
                extras.insert("unknownMisses".to_string(), Value::from(unknown));
                "array.includesRequiredBoth"
            } else if !known.is_empty() {
                extras.insert("knownMisses".to_string(), Value::Array(known));
                "array.includesRequiredKnowns"
            } else {
                extras.insert("unknownMisses".to_string(), Value::from(unknown));
                "array.includesRequiredUnknowns"
            };
            errors.push(self.detail(code, state, label, opts, extras, Vec::new()));
            if opts.abort_early() {
                return (finish(slots), errors);
            }
        }

        // Sparse policy applies after per-element validation.
        if !kind.sparse {
            for (pos, slot) in slots.iter().enumerate() {
                if matches!(slot, Slot::Hole) {
                    let mut path = state.path.clone();
                    path.push(PathSeg::Index(pos));
                    errors.push(self.detail_at(
                        "array.sparse",
                        path,
                        label,
                        opts,
                        IndexMap::new(),
                        Vec::new(),
                    ));
                    if opts.abort_early() {
                        return (finish(slots), errors);
                    }
                }
            }
        }

        if let Some(unique) = &kind.unique {
            let compare_key = |v: &Value| -> Option<Value> {
                match &unique.by {
                    Some(path) => {
                        let segments: Vec<String> = path.split('.').map(String::from).collect();
                        v.lookup(&segments).cloned()
                    }
                    None => Some(v.clone()),
                }
            };
            let kept: Vec<(usize, Option<Value>)> = slots
                .iter()
                .enumerate()
                .filter_map(|(pos, slot)| match slot {
                    Slot::Keep(v) => Some((pos, compare_key(v))),
                    _ => None,
                })
                .collect();
            'outer: for i in 1..kept.len() {
                for j in 0..i {
                    if let (Some(a), Some(b)) = (&kept[i].1, &kept[j].1) {
                        if deep_equal(a, b) {
                            let (pos, _) = kept[i];
                            let mut path = state.path.clone();
                            path.push(PathSeg::Index(pos));
                            let mut extras = IndexMap::new();
                            extras.insert("pos".to_string(), Value::from(pos));
                            errors.push(self.detail_at(
                                "array.unique",
                                path,
                                label,
                                opts,
                                extras,
                                Vec::new(),
                            ));
                            if opts.abort_early() {
                                break 'outer;
                            }
                        }
                    }
                }
            }
        }

        (finish(slots), errors)
    }

    /// Alternatives recursion: `try_` candidates win on first success;
    /// `when` branches refine a cumulative fork of the base schema, and the
    /// accumulator validates the value once all branches have spoken.
    fn walk_alternatives(
        &mut self,
        kind: &AltKind,
        value: Value,
        state: &State,
        label: &str,
        opts: &ValidationOptions,
    ) -> Outcome {
        let mut acc: Schema = kind
            .base
            .clone()
            .unwrap_or_else(|| Schema::new(Kind::Any));
        let mut has_when = false;

        for branch in &kind.branches {
            match branch {
                AltBranch::Try(candidate) => {
                    let outcome =
                        self.validate(candidate, Some(value.clone()), state, opts, None, false);
                    if outcome.errors.is_empty() {
                        return outcome;
                    }
                }
                AltBranch::When(when) => {
                    has_when = true;
                    let matched = match &when.condition {
                        BranchCondition::Ref { reference, is } => {
                            let resolved =
                                reference.resolve(state.parent(), opts.context.as_ref());
                            self.matches(is, resolved, state, opts)
                        }
                        BranchCondition::Peek(predicate) => {
                            self.matches(predicate, Some(value.clone()), state, opts)
                        }
                    };
                    tracing::trace!(matched, "when branch");
                    let side = if matched { &when.then } else { &when.otherwise };
                    if let Some(refinement) = side {
                        if let Ok(merged) = acc.concat(refinement) {
                            acc = merged;
                        }
                    }
                }
            }
        }

        if has_when {
            return self.validate(&acc, Some(value), state, opts, None, false);
        }

        Outcome {
            value: Some(value),
            errors: vec![self.detail(
                "alternatives.base",
                state,
                label,
                opts,
                IndexMap::new(),
                Vec::new(),
            )],
        }
    }
}

/// Slot for a matched array element: strip schemas discard it, an absent
/// result leaves a hole.
fn slot_for(schema: &Schema, value: Option<Value>) -> Slot {
    if schema.inner.flags.strip == Some(true) {
        Slot::Stripped
    } else {
        match value {
            Some(v) => Slot::Keep(v),
            None => Slot::Hole,
        }
    }
}

/// Display name of a node: its label flag, else its key, else `"value"`.
fn label_of(schema: &Schema, state: &State) -> String {
    schema
        .inner
        .flags
        .label
        .clone()
        .or_else(|| state.key().map(ToString::to_string))
        .unwrap_or_else(|| DEFAULT_LABEL.to_string())
}

/// The value as the empty matcher sees it: trimmed when a string node with
/// a trim rule converts.
fn pre_trimmed(schema: &Schema, value: &Value, opts: &ValidationOptions) -> Value {
    if opts.convert()
        && matches!(schema.inner.kind, Kind::String)
        && schema
            .inner
            .rules
            .iter()
            .any(|r| matches!(r, Rule::StringTrim))
    {
        if let Value::String(s) = value {
            return Value::String(s.trim().to_string());
        }
    }
    value.clone()
}
