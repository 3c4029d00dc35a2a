//! Conditional forks and alternative branches
//!
//! `when()` turns any node into an alternatives node whose branches refine a
//! cumulative schema: a matching branch merges its `then` side into the
//! accumulator, a non-matching one merges `otherwise`, and an omitted side
//! leaves the accumulator as it stands. `try_()` adds independent
//! candidates instead, tried in order with the first success winning.

use super::{AltBranch, AltKind, BranchCondition, Kind, Schema, WhenBranch};
use crate::cast::{self, Raw};
use models_core::{ModelsError, Reference, Result};

/// Condition of a `when()` fork: a reference test or a predicate schema
/// applied to the candidate value itself.
#[derive(Clone)]
pub enum Condition {
    /// Resolve a reference and test it against the branch's `is` schema
    Ref(Reference),
    /// Test the whole candidate value against a predicate schema
    Peek(Schema),
}

impl From<Reference> for Condition {
    fn from(r: Reference) -> Self {
        Condition::Ref(r)
    }
}

impl From<&str> for Condition {
    fn from(key: &str) -> Self {
        Condition::Ref(Reference::new(key))
    }
}

impl From<Schema> for Condition {
    fn from(s: Schema) -> Self {
        Condition::Peek(s)
    }
}

/// Branch description for [`Schema::when`].
///
/// At least one of `then`/`otherwise` must be given. A literal `is` is
/// compiled to a required exact-match schema, so an absent referent never
/// satisfies a literal condition.
#[derive(Clone, Default)]
pub struct When {
    pub(crate) is: Option<Schema>,
    pub(crate) then: Option<Schema>,
    pub(crate) otherwise: Option<Schema>,
}

impl When {
    /// Branch with no `is` test (the condition is "referent is present").
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Branch testing the referent against a schema or literal.
    #[must_use]
    pub fn is(matcher: impl Into<Raw>) -> Self {
        let raw = matcher.into();
        let schema = match raw {
            Raw::Schema(s) => s,
            other => cast::compile(other).required(),
        };
        Self {
            is: Some(schema),
            then: None,
            otherwise: None,
        }
    }

    /// Schema applied when the condition holds.
    #[must_use]
    pub fn then(mut self, schema: Schema) -> Self {
        self.then = Some(schema);
        self
    }

    /// Schema applied when the condition does not hold.
    #[must_use]
    pub fn otherwise(mut self, schema: Schema) -> Self {
        self.otherwise = Some(schema);
        self
    }
}

/// Fork `base` on a condition, producing (or extending) an alternatives
/// node.
pub(crate) fn fork(base: &Schema, condition: Condition, when: When) -> Result<Schema> {
    if when.then.is_none() && when.otherwise.is_none() {
        return Err(ModelsError::construction(
            "when() requires at least one of then or otherwise",
        ));
    }

    let branch_condition = match condition {
        Condition::Ref(reference) => {
            let is = when
                .is
                .unwrap_or_else(|| Schema::new(Kind::Any).required());
            BranchCondition::Ref { reference, is }
        }
        Condition::Peek(schema) => {
            if when.is.is_some() {
                return Err(ModelsError::construction(
                    "when() with a schema condition cannot also carry an is schema",
                ));
            }
            BranchCondition::Peek(schema)
        }
    };

    let branch = WhenBranch {
        condition: branch_condition,
        then: when.then,
        otherwise: when.otherwise,
    };

    if matches!(&base.inner.kind, Kind::Alternatives(_)) {
        return Ok(base.map(|i| {
            if let Kind::Alternatives(kind) = &mut i.kind {
                kind.branches.push(AltBranch::When(branch.clone()));
            }
        }));
    }

    Ok(Schema::new(Kind::Alternatives(AltKind {
        base: Some(base.clone()),
        branches: vec![AltBranch::When(branch)],
    })))
}

impl Schema {
    /// Add independent candidate schemas, tried in order.
    ///
    /// # Panics
    ///
    /// On non-alternatives nodes.
    #[must_use]
    pub fn try_<I>(&self, schemas: I) -> Schema
    where
        I: IntoIterator<Item = Schema>,
    {
        self.guard(&["alternatives"], "try_");
        self.map(|i| {
            if let Kind::Alternatives(kind) = &mut i.kind {
                kind.branches
                    .extend(schemas.into_iter().map(AltBranch::Try));
            }
        })
    }
}
