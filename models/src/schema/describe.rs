//! Describe: project a schema node into a plain descriptor tree
//!
//! A pure projection with no validation side effects. References serialize
//! as `"ref:<path>"`/`"context:<path>"` strings, empty collections are
//! omitted, and alternatives nodes always carry `presence: "ignore"`.

use super::rules::Rule;
use super::{AltBranch, BranchCondition, DefaultValue, Kind, Schema, ValueSet};
use indexmap::IndexMap;
use models_core::Value;

pub(crate) fn describe(schema: &Schema) -> Value {
    let mut out: IndexMap<String, Value> = IndexMap::new();
    out.insert(
        "type".to_string(),
        Value::String(schema.inner.kind.name().to_string()),
    );

    if let Some(flags) = describe_flags(schema) {
        out.insert("flags".to_string(), flags);
    }

    if let Some(label) = &schema.inner.flags.label {
        out.insert("label".to_string(), Value::String(label.clone()));
    }
    if let Some(text) = &schema.inner.flags.description {
        out.insert("description".to_string(), Value::String(text.clone()));
    }
    if let Some(unit) = &schema.inner.flags.unit {
        out.insert("unit".to_string(), Value::String(unit.clone()));
    }

    if !schema.inner.rules.is_empty() {
        let rules: Vec<Value> = schema.inner.rules.iter().map(describe_rule).collect();
        out.insert("rules".to_string(), Value::Array(rules));
    }

    if let Some(valids) = describe_set(&schema.inner.valids) {
        out.insert("valids".to_string(), valids);
    }
    if let Some(invalids) = describe_set(&schema.inner.invalids) {
        out.insert("invalids".to_string(), invalids);
    }

    match &schema.inner.kind {
        Kind::Object(kind) => {
            if let Some(children) = &kind.children {
                let described: IndexMap<String, Value> = children
                    .iter()
                    .map(|(key, child)| (key.clone(), describe(child)))
                    .collect();
                out.insert("children".to_string(), Value::Object(described));
            }
            if !kind.dependencies.is_empty() {
                let deps: Vec<Value> = kind
                    .dependencies
                    .iter()
                    .map(|d| {
                        let mut entry = IndexMap::new();
                        match d {
                            super::Dependency::And(peers) => {
                                entry.insert("type".to_string(), Value::from("and"));
                                entry.insert("peers".to_string(), string_list(peers));
                            }
                            super::Dependency::Or(peers) => {
                                entry.insert("type".to_string(), Value::from("or"));
                                entry.insert("peers".to_string(), string_list(peers));
                            }
                            super::Dependency::With { key, peers } => {
                                entry.insert("type".to_string(), Value::from("with"));
                                entry.insert("key".to_string(), Value::String(key.clone()));
                                entry.insert("peers".to_string(), string_list(peers));
                            }
                            super::Dependency::Without { key, peers } => {
                                entry.insert("type".to_string(), Value::from("without"));
                                entry.insert("key".to_string(), Value::String(key.clone()));
                                entry.insert("peers".to_string(), string_list(peers));
                            }
                            super::Dependency::Assert {
                                reference, schema, ..
                            } => {
                                entry.insert("type".to_string(), Value::from("assert"));
                                entry.insert(
                                    "ref".to_string(),
                                    Value::String(reference.display_path()),
                                );
                                entry.insert("schema".to_string(), describe(schema));
                            }
                        }
                        Value::Object(entry)
                    })
                    .collect();
                out.insert("dependencies".to_string(), Value::Array(deps));
            }
            if !kind.renames.is_empty() {
                let renames: Vec<Value> = kind
                    .renames
                    .iter()
                    .map(|r| {
                        let mut entry = IndexMap::new();
                        entry.insert("from".to_string(), Value::String(r.from.clone()));
                        entry.insert("to".to_string(), Value::String(r.to.clone()));
                        Value::Object(entry)
                    })
                    .collect();
                out.insert("renames".to_string(), Value::Array(renames));
            }
        }
        Kind::Array(kind) => {
            if !kind.items.is_empty() {
                out.insert(
                    "items".to_string(),
                    Value::Array(kind.items.iter().map(describe).collect()),
                );
            }
            if !kind.ordered.is_empty() {
                out.insert(
                    "orderedItems".to_string(),
                    Value::Array(kind.ordered.iter().map(describe).collect()),
                );
            }
        }
        Kind::Boolean(kind) => {
            if !kind.truthy.is_empty() {
                out.insert("truthy".to_string(), Value::Array(kind.truthy.clone()));
            }
            if !kind.falsy.is_empty() {
                out.insert("falsy".to_string(), Value::Array(kind.falsy.clone()));
            }
        }
        Kind::Alternatives(kind) => {
            if let Some(base) = &kind.base {
                out.insert("base".to_string(), describe(base));
            }
            if !kind.branches.is_empty() {
                let branches: Vec<Value> = kind
                    .branches
                    .iter()
                    .map(|branch| match branch {
                        AltBranch::Try(s) => describe(s),
                        AltBranch::When(w) => {
                            let mut entry = IndexMap::new();
                            match &w.condition {
                                BranchCondition::Ref { reference, is } => {
                                    entry.insert(
                                        "ref".to_string(),
                                        Value::String(reference.display_path()),
                                    );
                                    entry.insert("is".to_string(), describe(is));
                                }
                                BranchCondition::Peek(p) => {
                                    entry.insert("peek".to_string(), describe(p));
                                }
                            }
                            if let Some(then) = &w.then {
                                entry.insert("then".to_string(), describe(then));
                            }
                            if let Some(otherwise) = &w.otherwise {
                                entry.insert("otherwise".to_string(), describe(otherwise));
                            }
                            Value::Object(entry)
                        }
                    })
                    .collect();
                out.insert("alternatives".to_string(), Value::Array(branches));
            }
        }
        _ => {}
    }

    if !schema.inner.meta.is_empty() {
        out.insert("meta".to_string(), Value::Array(schema.inner.meta.clone()));
    }
    if !schema.inner.notes.is_empty() {
        out.insert(
            "notes".to_string(),
            string_list(&schema.inner.notes),
        );
    }
    if !schema.inner.tags.is_empty() {
        out.insert("tags".to_string(), string_list(&schema.inner.tags));
    }
    if !schema.inner.examples.is_empty() {
        out.insert(
            "examples".to_string(),
            Value::Array(schema.inner.examples.clone()),
        );
    }

    if let Some(settings) = &schema.inner.settings {
        if let Some(options) = settings.describe() {
            out.insert("options".to_string(), options);
        }
    }

    Value::Object(out)
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
}

fn describe_flags(schema: &Schema) -> Option<Value> {
    let flags = &schema.inner.flags;
    let mut out: IndexMap<String, Value> = IndexMap::new();

    match flags.presence {
        Some(presence) => {
            out.insert(
                "presence".to_string(),
                Value::String(presence.as_str().to_string()),
            );
        }
        // Alternatives nodes delegate presence to their branches.
        None if matches!(schema.inner.kind, Kind::Alternatives(_)) => {
            out.insert("presence".to_string(), Value::String("ignore".to_string()));
        }
        None => {}
    }

    if flags.allow_only == Some(true) {
        out.insert("allowOnly".to_string(), Value::Bool(true));
    }
    if flags.insensitive == Some(true) {
        out.insert("insensitive".to_string(), Value::Bool(true));
    }
    if flags.strip == Some(true) {
        out.insert("strip".to_string(), Value::Bool(true));
    }
    if flags.raw == Some(true) {
        out.insert("raw".to_string(), Value::Bool(true));
    }
    match &flags.default {
        Some(DefaultValue::Literal(v)) => {
            out.insert("default".to_string(), v.clone());
        }
        Some(DefaultValue::Ref(r)) => {
            out.insert("default".to_string(), Value::String(r.display_path()));
        }
        Some(DefaultValue::Func { description, .. }) => {
            out.insert("default".to_string(), Value::String(description.clone()));
        }
        None => {}
    }
    if let Some(empty) = &flags.empty {
        out.insert("empty".to_string(), describe(empty));
    }

    if let Kind::Array(kind) = &schema.inner.kind {
        if kind.sparse {
            out.insert("sparse".to_string(), Value::Bool(true));
        }
        if kind.single {
            out.insert("single".to_string(), Value::Bool(true));
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(Value::Object(out))
    }
}

fn describe_rule(rule: &Rule) -> Value {
    let mut entry = IndexMap::new();
    entry.insert(
        "name".to_string(),
        Value::String(rule.name().to_string()),
    );
    if let Some(arg) = rule.describe_arg() {
        entry.insert("arg".to_string(), arg);
    }
    Value::Object(entry)
}

fn describe_set(set: &ValueSet) -> Option<Value> {
    if set.is_empty() {
        return None;
    }
    Some(Value::Array(set.describe_entries()))
}
