//! Schema nodes and builders
//!
//! A [`Schema`] is an immutable description of the constraints for one value
//! position. Builders never mutate: each call either returns the same handle
//! (when the call would change nothing) or a new node with the delta
//! applied, so published nodes are always safe to share across concurrent
//! validations.

pub(crate) mod rules;

mod alternatives;
mod array;
mod boolean;
mod concat;
mod describe;
mod object;
mod scalar;

pub use alternatives::{Condition, When};
pub use object::RenameOptions;
pub use scalar::LimitArg;

pub(crate) use scalar::parse_date_string;

use crate::cast::{self, Raw};
use crate::validator::errors::{Detail, Override, ValidationError};
use crate::validator::{ValidationOptions, Validated};
use indexmap::IndexMap;
use models_core::{deep_equal, ModelsError, Reference, Result, Value};
use rules::Rule;
use std::fmt;
use std::sync::Arc;

/// Presence expectation for a value position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Value must be present
    Required,
    /// Value may be absent
    Optional,
    /// Value must be absent
    Forbidden,
    /// Value is passed through without any checks
    Ignore,
}

impl Presence {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Presence::Required => "required",
            Presence::Optional => "optional",
            Presence::Forbidden => "forbidden",
            Presence::Ignore => "ignore",
        }
    }
}

/// A configured default for an absent value.
#[derive(Clone)]
pub(crate) enum DefaultValue {
    Literal(Value),
    Ref(Reference),
    Func {
        description: String,
        f: Arc<dyn Fn(Option<&Value>) -> std::result::Result<Value, String> + Send + Sync>,
    },
}

/// Per-node error override hook.
#[derive(Clone)]
pub(crate) enum ErrorOverride {
    /// Replace the composed message with a fixed string
    Message(String),
    /// Rewrite the node's detail list
    With(Arc<dyn Fn(Vec<Detail>) -> Override + Send + Sync>),
}

/// An entry in a valid/invalid set.
#[derive(Clone)]
pub(crate) enum SetEntry {
    Literal(Value),
    Ref(Reference),
}

/// Ordered set of literal values and references.
///
/// Literals deduplicate by deep equality; references keep identity semantics
/// and are never deduplicated.
#[derive(Clone, Default)]
pub(crate) struct ValueSet {
    pub entries: Vec<SetEntry>,
}

impl ValueSet {
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn add_literal(&mut self, value: Value) {
        let exists = self.entries.iter().any(|e| match e {
            SetEntry::Literal(v) => deep_equal(v, &value),
            SetEntry::Ref(_) => false,
        });
        if !exists {
            self.entries.push(SetEntry::Literal(value));
        }
    }

    pub(crate) fn add_ref(&mut self, reference: Reference) {
        self.entries.push(SetEntry::Ref(reference));
    }

    pub(crate) fn remove_literal(&mut self, value: &Value) {
        self.entries.retain(|e| match e {
            SetEntry::Literal(v) => !deep_equal(v, value),
            SetEntry::Ref(_) => true,
        });
    }

    /// Membership test with references resolved against the current state.
    pub(crate) fn contains(
        &self,
        value: &Value,
        insensitive: bool,
        parent: Option<&Value>,
        context: Option<&Value>,
    ) -> bool {
        self.entries.iter().any(|entry| {
            let candidate = match entry {
                SetEntry::Literal(v) => Some(v.clone()),
                SetEntry::Ref(r) => r.resolve(parent, context),
            };
            let Some(candidate) = candidate else {
                return false;
            };
            if insensitive {
                if let (Value::String(a), Value::String(b)) = (&candidate, value) {
                    return a.eq_ignore_ascii_case(b);
                }
            }
            deep_equal(&candidate, value)
        })
    }

    /// Entries rendered for error context and describe output.
    pub(crate) fn describe_entries(&self) -> Vec<Value> {
        self.entries
            .iter()
            .map(|e| match e {
                SetEntry::Literal(v) => v.clone(),
                SetEntry::Ref(r) => Value::String(r.display_path()),
            })
            .collect()
    }

    pub(crate) fn merge(&mut self, other: &ValueSet) {
        for entry in &other.entries {
            match entry {
                SetEntry::Literal(v) => self.add_literal(v.clone()),
                SetEntry::Ref(r) => self.add_ref(r.clone()),
            }
        }
    }
}

/// Named flags of a node. Unset fields are absent, which matters for merge
/// precedence: a right-hand side without a flag never clears the left's.
#[derive(Clone, Default)]
pub(crate) struct Flags {
    pub presence: Option<Presence>,
    pub insensitive: Option<bool>,
    pub default: Option<DefaultValue>,
    pub strip: Option<bool>,
    pub raw: Option<bool>,
    pub allow_only: Option<bool>,
    pub empty: Option<Schema>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub error: Option<ErrorOverride>,
}

/// Array-specific payload.
#[derive(Clone, Default)]
pub(crate) struct ArrayKind {
    pub items: Vec<Schema>,
    pub ordered: Vec<Schema>,
    pub sparse: bool,
    pub single: bool,
    pub unique: Option<UniqueRule>,
}

/// Uniqueness constraint, optionally comparing by a dotted path.
#[derive(Clone)]
pub(crate) struct UniqueRule {
    pub by: Option<String>,
}

/// Boolean-specific payload: custom truthy/falsy conversion tables.
#[derive(Clone, Default)]
pub(crate) struct BooleanKind {
    pub truthy: Vec<Value>,
    pub falsy: Vec<Value>,
}

/// Object-specific payload.
#[derive(Clone, Default)]
pub(crate) struct ObjectKind {
    /// `None` allows any keys; `Some` with an empty map allows none.
    pub children: Option<IndexMap<String, Schema>>,
    pub dependencies: Vec<Dependency>,
    pub renames: Vec<Rename>,
}

/// Cross-key dependency constraint.
#[derive(Clone)]
pub(crate) enum Dependency {
    And(Vec<String>),
    Or(Vec<String>),
    With { key: String, peers: Vec<String> },
    Without { key: String, peers: Vec<String> },
    Assert {
        reference: Reference,
        schema: Schema,
        message: Option<String>,
    },
}

/// Key rename applied before child validation.
#[derive(Clone)]
pub(crate) struct Rename {
    pub from: String,
    pub to: String,
    pub alias: bool,
    pub multiple: bool,
    pub override_target: bool,
    pub ignore_undefined: bool,
}

/// Alternatives payload: an optional base schema and the ordered branches.
#[derive(Clone, Default)]
pub(crate) struct AltKind {
    pub base: Option<Schema>,
    pub branches: Vec<AltBranch>,
}

/// One alternatives branch.
#[derive(Clone)]
pub(crate) enum AltBranch {
    /// Independent candidate: first success wins
    Try(Schema),
    /// Conditional refinement of the cumulative schema
    When(WhenBranch),
}

/// A conditional branch recorded by `when()`.
#[derive(Clone)]
pub(crate) struct WhenBranch {
    pub condition: BranchCondition,
    pub then: Option<Schema>,
    pub otherwise: Option<Schema>,
}

/// How a `when()` branch decides whether it applies.
#[derive(Clone)]
pub(crate) enum BranchCondition {
    /// Resolve a reference and test it against the `is` schema
    Ref { reference: Reference, is: Schema },
    /// Test the candidate value itself against a predicate schema
    Peek(Schema),
}

/// Lazily produced schema, resolved only when the executor visits the node.
#[derive(Clone)]
pub(crate) struct LazyKind {
    pub thunk: Arc<dyn Fn() -> Schema + Send + Sync>,
}

/// Closed union of node kinds with their type-specific payloads.
#[derive(Clone)]
pub(crate) enum Kind {
    Any,
    Array(ArrayKind),
    Boolean(BooleanKind),
    Binary,
    Date,
    Lazy(LazyKind),
    Number,
    Object(ObjectKind),
    String,
    Alternatives(AltKind),
}

impl Kind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Kind::Any => "any",
            Kind::Array(_) => "array",
            Kind::Boolean(_) => "boolean",
            Kind::Binary => "binary",
            Kind::Date => "date",
            Kind::Lazy(_) => "lazy",
            Kind::Number => "number",
            Kind::Object(_) => "object",
            Kind::String => "string",
            Kind::Alternatives(_) => "alternatives",
        }
    }
}

#[derive(Clone)]
pub(crate) struct Inner {
    pub kind: Kind,
    pub flags: Flags,
    pub rules: Vec<Rule>,
    pub valids: ValueSet,
    pub invalids: ValueSet,
    pub meta: Vec<Value>,
    pub notes: Vec<String>,
    pub tags: Vec<String>,
    pub examples: Vec<Value>,
    pub settings: Option<ValidationOptions>,
}

/// Immutable description of the constraints for one value position.
///
/// Cloning is cheap (shared inner); builders follow clone-on-write with an
/// identity fast path observable through [`Schema::same`].
#[derive(Clone)]
pub struct Schema {
    pub(crate) inner: Arc<Inner>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema<{}>", self.inner.kind.name())
    }
}

impl Schema {
    pub(crate) fn new(kind: Kind) -> Self {
        Schema {
            inner: Arc::new(Inner {
                kind,
                flags: Flags::default(),
                rules: Vec::new(),
                valids: ValueSet::default(),
                invalids: ValueSet::default(),
                meta: Vec::new(),
                notes: Vec::new(),
                tags: Vec::new(),
                examples: Vec::new(),
                settings: None,
            }),
        }
    }

    /// Whether two handles refer to the same node.
    ///
    /// No-op builder calls return the original node, so
    /// `s.required().same(&s.required().required())` holds.
    #[must_use]
    pub fn same(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Base type name of this node.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.inner.kind.name()
    }

    /// Clone-on-write: apply a delta to a fresh inner node.
    pub(crate) fn map(&self, f: impl FnOnce(&mut Inner)) -> Schema {
        let mut inner = (*self.inner).clone();
        f(&mut inner);
        Schema {
            inner: Arc::new(inner),
        }
    }

    fn with_presence(&self, presence: Presence) -> Schema {
        if self.inner.flags.presence == Some(presence) {
            return self.clone();
        }
        self.map(|i| i.flags.presence = Some(presence))
    }

    /// Mark the value as mandatory.
    #[must_use]
    pub fn required(&self) -> Schema {
        self.with_presence(Presence::Required)
    }

    /// Mark the value as optional (the default).
    #[must_use]
    pub fn optional(&self) -> Schema {
        self.with_presence(Presence::Optional)
    }

    /// Forbid the value from being present.
    #[must_use]
    pub fn forbidden(&self) -> Schema {
        self.with_presence(Presence::Forbidden)
    }

    /// Add allowed values and restrict the value to the allow-list.
    #[must_use]
    pub fn valid<I, V>(&self, values: I) -> Schema
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.map(|i| {
            i.flags.allow_only = Some(true);
            for value in values {
                let value = value.into();
                i.invalids.remove_literal(&value);
                i.valids.add_literal(value);
            }
        })
    }

    /// Add an allowed reference and restrict to the allow-list.
    #[must_use]
    pub fn valid_ref(&self, reference: Reference) -> Schema {
        self.map(|i| {
            i.flags.allow_only = Some(true);
            i.valids.add_ref(reference);
        })
    }

    /// Add allowed values without restricting other input.
    #[must_use]
    pub fn allow<I, V>(&self, values: I) -> Schema
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.map(|i| {
            for value in values {
                let value = value.into();
                i.invalids.remove_literal(&value);
                i.valids.add_literal(value);
            }
        })
    }

    /// Add an allowed reference without restricting other input.
    #[must_use]
    pub fn allow_ref(&self, reference: Reference) -> Schema {
        self.map(|i| i.valids.add_ref(reference))
    }

    /// Add denied values.
    #[must_use]
    pub fn invalid<I, V>(&self, values: I) -> Schema
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.map(|i| {
            for value in values {
                let value = value.into();
                i.valids.remove_literal(&value);
                i.invalids.add_literal(value);
            }
        })
    }

    /// Add a denied reference.
    #[must_use]
    pub fn invalid_ref(&self, reference: Reference) -> Schema {
        self.map(|i| i.invalids.add_ref(reference))
    }

    /// Set a literal default applied when the value ends up absent.
    #[must_use]
    pub fn default_value(&self, value: impl Into<Value>) -> Schema {
        self.map(|i| i.flags.default = Some(DefaultValue::Literal(value.into())))
    }

    /// Set a reference default, resolved against the post-validation
    /// siblings of the absent key.
    #[must_use]
    pub fn default_ref(&self, reference: Reference) -> Schema {
        self.map(|i| i.flags.default = Some(DefaultValue::Ref(reference)))
    }

    /// Set a computed default. The function receives a clone of the parent
    /// object (or `None` at the root); an `Err` surfaces as an `any.default`
    /// failure with the message captured in the detail context.
    #[must_use]
    pub fn default_fn<F>(&self, description: impl Into<String>, f: F) -> Schema
    where
        F: Fn(Option<&Value>) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.map(|i| {
            i.flags.default = Some(DefaultValue::Func {
                description: description.into(),
                f: Arc::new(f),
            });
        })
    }

    /// Remove the value from the parent after successful validation.
    #[must_use]
    pub fn strip(&self) -> Schema {
        if self.inner.flags.strip == Some(true) {
            return self.clone();
        }
        self.map(|i| i.flags.strip = Some(true))
    }

    /// Return the pre-conversion input on success.
    #[must_use]
    pub fn raw(&self) -> Schema {
        if self.inner.flags.raw == Some(true) {
            return self.clone();
        }
        self.map(|i| i.flags.raw = Some(true))
    }

    /// Treat values matching the given schema (or literal) as absent.
    #[must_use]
    pub fn empty(&self, matcher: impl Into<Raw>) -> Schema {
        let schema = cast::compile(matcher.into());
        self.map(|i| i.flags.empty = Some(schema))
    }

    /// Case-insensitive matching for valid/invalid sets and conversion
    /// tables (string and boolean nodes).
    #[must_use]
    pub fn insensitive(&self) -> Schema {
        if self.inner.flags.insensitive == Some(true) {
            return self.clone();
        }
        self.map(|i| i.flags.insensitive = Some(true))
    }

    /// Set the display name used in failure messages for this node only.
    #[must_use]
    pub fn label(&self, label: impl Into<String>) -> Schema {
        let label = label.into();
        if self.inner.flags.label.as_deref() == Some(label.as_str()) {
            return self.clone();
        }
        self.map(|i| i.flags.label = Some(label))
    }

    /// Attach a human description.
    #[must_use]
    pub fn description(&self, text: impl Into<String>) -> Schema {
        self.map(|i| i.flags.description = Some(text.into()))
    }

    /// Attach a unit annotation.
    #[must_use]
    pub fn unit(&self, name: impl Into<String>) -> Schema {
        self.map(|i| i.flags.unit = Some(name.into()))
    }

    /// Append a meta annotation (never deduplicated).
    #[must_use]
    pub fn meta(&self, value: impl Into<Value>) -> Schema {
        self.map(|i| i.meta.push(value.into()))
    }

    /// Append a note.
    #[must_use]
    pub fn notes(&self, note: impl Into<String>) -> Schema {
        self.map(|i| i.notes.push(note.into()))
    }

    /// Append tags.
    #[must_use]
    pub fn tags<I, S>(&self, tags: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map(|i| i.tags.extend(tags.into_iter().map(Into::into)))
    }

    /// Append an example value.
    #[must_use]
    pub fn example(&self, value: impl Into<Value>) -> Schema {
        self.map(|i| i.examples.push(value.into()))
    }

    /// Replace every failure of this subtree with a fixed message. The
    /// original details stay reachable through the override's reason chain.
    #[must_use]
    pub fn error_message(&self, message: impl Into<String>) -> Schema {
        self.map(|i| i.flags.error = Some(ErrorOverride::Message(message.into())))
    }

    /// Install an error-rewriting hook for this node.
    #[must_use]
    pub fn error_with<F>(&self, f: F) -> Schema
    where
        F: Fn(Vec<Detail>) -> Override + Send + Sync + 'static,
    {
        self.map(|i| i.flags.error = Some(ErrorOverride::With(Arc::new(f))))
    }

    /// Override validation options for this subtree. The node's settings win
    /// over call-level options.
    ///
    /// # Errors
    ///
    /// Rejects a `context` override: context belongs to the validate call.
    pub fn options(&self, settings: ValidationOptions) -> Result<Schema> {
        if settings.context.is_some() {
            return Err(ModelsError::options(
                "context is call-scoped and cannot be set on a schema node",
            ));
        }
        Ok(self.map(|i| {
            let merged = match &i.settings {
                Some(existing) => existing.merged_with(&settings),
                None => settings,
            };
            i.settings = Some(merged);
        }))
    }

    /// Disable conversion for this subtree.
    #[must_use]
    pub fn strict(&self) -> Schema {
        self.map(|i| {
            let mut settings = i.settings.clone().unwrap_or_default();
            settings.convert = Some(false);
            i.settings = Some(settings);
        })
    }

    /// Merge another schema of the same base type into this one.
    ///
    /// # Errors
    ///
    /// Fails when the base types differ (an `any` side adopts the other
    /// side's type).
    pub fn concat(&self, other: &Schema) -> Result<Schema> {
        concat::concat(self, other)
    }

    /// Fork this schema on a condition. See [`When`].
    ///
    /// # Errors
    ///
    /// Fails when both `then` and `otherwise` are omitted.
    pub fn when(&self, condition: impl Into<Condition>, when: When) -> Result<Schema> {
        alternatives::fork(self, condition.into(), when)
    }

    /// Project this node into a plain descriptor tree.
    #[must_use]
    pub fn describe(&self) -> Value {
        describe::describe(self)
    }

    /// Validate a value against this schema with default options.
    pub fn validate(&self, value: impl Into<Option<Value>>) -> Validated {
        crate::validator::validate_schema(self, value.into(), &ValidationOptions::default())
    }

    /// Validate a value with explicit options.
    pub fn validate_with(&self, value: impl Into<Option<Value>>, options: &ValidationOptions) -> Validated {
        crate::validator::validate_schema(self, value.into(), options)
    }

    /// Callback-style validation: the result is handed to `sink`.
    pub fn validate_callback<R>(
        &self,
        value: impl Into<Option<Value>>,
        options: &ValidationOptions,
        sink: impl FnOnce(Validated) -> R,
    ) -> R {
        sink(self.validate_with(value, options))
    }

    /// Promise-style validation: resolves with the coerced value or the
    /// aggregate error. Drives the same synchronous executor.
    pub async fn validate_async(
        &self,
        value: impl Into<Option<Value>>,
    ) -> std::result::Result<Option<Value>, ValidationError> {
        self.validate(value).into_result()
    }
}
