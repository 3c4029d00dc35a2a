//! Structural schema merging
//!
//! `a.concat(b)` combines two nodes of the same base type: `b`'s flags win
//! on collision, valid/invalid sets union with `a`'s entries first, rule
//! lists concatenate (duplicates all stay active), object children merge
//! key-wise and recursively, and annotation lists append. An `any` side
//! adopts the other side's type without weakening flags already present on
//! the left.

use super::{Flags, Inner, Kind, Schema};
use models_core::{ModelsError, Result};
use std::sync::Arc;

pub(crate) fn concat(a: &Schema, b: &Schema) -> Result<Schema> {
    let kind = merge_kinds(&a.inner.kind, &b.inner.kind)?;

    let mut valids = a.inner.valids.clone();
    valids.merge(&b.inner.valids);
    let mut invalids = a.inner.invalids.clone();
    invalids.merge(&b.inner.invalids);

    let mut rules = a.inner.rules.clone();
    rules.extend(b.inner.rules.iter().cloned());

    let mut meta = a.inner.meta.clone();
    meta.extend(b.inner.meta.iter().cloned());
    let mut notes = a.inner.notes.clone();
    notes.extend(b.inner.notes.iter().cloned());
    let mut tags = a.inner.tags.clone();
    tags.extend(b.inner.tags.iter().cloned());
    let mut examples = a.inner.examples.clone();
    examples.extend(b.inner.examples.iter().cloned());

    let settings = match (&a.inner.settings, &b.inner.settings) {
        (None, None) => None,
        (Some(s), None) => Some(s.clone()),
        (None, Some(s)) => Some(s.clone()),
        (Some(left), Some(right)) => Some(left.merged_with(right)),
    };

    Ok(Schema {
        inner: Arc::new(Inner {
            kind,
            flags: merge_flags(&a.inner.flags, &b.inner.flags),
            rules,
            valids,
            invalids,
            meta,
            notes,
            tags,
            examples,
            settings,
        }),
    })
}

fn merge_flags(a: &Flags, b: &Flags) -> Flags {
    Flags {
        presence: b.presence.or(a.presence),
        insensitive: b.insensitive.or(a.insensitive),
        default: b.default.clone().or_else(|| a.default.clone()),
        strip: b.strip.or(a.strip),
        raw: b.raw.or(a.raw),
        allow_only: b.allow_only.or(a.allow_only),
        empty: b.empty.clone().or_else(|| a.empty.clone()),
        label: b.label.clone().or_else(|| a.label.clone()),
        description: b.description.clone().or_else(|| a.description.clone()),
        unit: b.unit.clone().or_else(|| a.unit.clone()),
        error: b.error.clone().or_else(|| a.error.clone()),
    }
}

fn merge_kinds(a: &Kind, b: &Kind) -> Result<Kind> {
    match (a, b) {
        (Kind::Any, other) => Ok(other.clone()),
        (other, Kind::Any) => Ok(other.clone()),

        (Kind::String, Kind::String) => Ok(Kind::String),
        (Kind::Number, Kind::Number) => Ok(Kind::Number),
        (Kind::Date, Kind::Date) => Ok(Kind::Date),
        (Kind::Binary, Kind::Binary) => Ok(Kind::Binary),

        (Kind::Boolean(x), Kind::Boolean(y)) => {
            let mut merged = x.clone();
            merged.truthy.extend(y.truthy.iter().cloned());
            merged.falsy.extend(y.falsy.iter().cloned());
            Ok(Kind::Boolean(merged))
        }

        (Kind::Array(x), Kind::Array(y)) => {
            let mut merged = x.clone();
            merged.items.extend(y.items.iter().cloned());
            merged.ordered.extend(y.ordered.iter().cloned());
            merged.sparse = x.sparse || y.sparse;
            merged.single = x.single || y.single;
            if y.unique.is_some() {
                merged.unique = y.unique.clone();
            }
            Ok(Kind::Array(merged))
        }

        (Kind::Object(x), Kind::Object(y)) => {
            let children = match (&x.children, &y.children) {
                (None, None) => None,
                (Some(c), None) => Some(c.clone()),
                (None, Some(c)) => Some(c.clone()),
                (Some(left), Some(right)) => {
                    let mut merged = left.clone();
                    for (key, child) in right {
                        let combined = match merged.get(key) {
                            Some(existing) => existing.concat(child)?,
                            None => child.clone(),
                        };
                        merged.insert(key.clone(), combined);
                    }
                    Some(merged)
                }
            };
            let mut merged = x.clone();
            merged.children = children;
            merged.dependencies.extend(y.dependencies.iter().cloned());
            merged.renames.extend(y.renames.iter().cloned());
            Ok(Kind::Object(merged))
        }

        (Kind::Alternatives(x), Kind::Alternatives(y)) => {
            let mut merged = x.clone();
            merged.branches.extend(y.branches.iter().cloned());
            if merged.base.is_none() {
                merged.base = y.base.clone();
            }
            Ok(Kind::Alternatives(merged))
        }

        (Kind::Lazy(_), Kind::Lazy(_)) => Err(ModelsError::construction(
            "cannot merge lazy schemas; resolve them first",
        )),

        (x, y) => Err(ModelsError::type_mismatch(x.name(), y.name())),
    }
}
