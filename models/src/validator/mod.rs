//! Validation entry points and options
//!
//! A single synchronous executor drives every form of `validate`. Options
//! are `Option`-valued so that node-level settings can be layered over
//! call-level options without clobbering unset fields.

pub mod errors;
mod engine;
mod state;

pub use errors::{Context, Detail, Override, PathSeg, ValidationError};

use crate::schema::{Presence, Schema};
use engine::Executor;
use indexmap::IndexMap;
use models_core::Value;
use state::State;

/// Which unknown content `strip_unknown` removes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripUnknown {
    /// Strip array elements that match no item schema
    pub arrays: bool,
    /// Strip object keys with no declared schema
    pub objects: bool,
}

impl StripUnknown {
    /// Strip both unknown object keys and unmatched array elements.
    #[must_use]
    pub fn all() -> Self {
        Self {
            arrays: true,
            objects: true,
        }
    }
}

/// Options for a validate call. Unset fields fall back to the defaults;
/// node-level settings (via `options()`/`strict()`) win over call-level
/// values for their subtree.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Attempt type coercion (default true)
    pub convert: Option<bool>,
    /// Stop at the first failure (default true)
    pub abort_early: Option<bool>,
    /// Permit object keys with no declared schema (default false)
    pub allow_unknown: Option<bool>,
    /// Remove unknown content instead of failing on it
    pub strip_unknown: Option<StripUnknown>,
    /// Skip default application entirely (default false)
    pub no_defaults: Option<bool>,
    /// Presence applied to nodes without an explicit presence flag
    pub presence: Option<Presence>,
    /// Out-of-band object for context references
    pub context: Option<Value>,
    /// Message template overrides, keyed by failure code
    pub language: Option<IndexMap<String, String>>,
}

impl ValidationOptions {
    /// Effective `convert` setting.
    #[must_use]
    pub fn convert(&self) -> bool {
        self.convert.unwrap_or(true)
    }

    /// Effective `abort_early` setting.
    #[must_use]
    pub fn abort_early(&self) -> bool {
        self.abort_early.unwrap_or(true)
    }

    /// Effective `allow_unknown` setting.
    #[must_use]
    pub fn allow_unknown(&self) -> bool {
        self.allow_unknown.unwrap_or(false)
    }

    /// Effective `no_defaults` setting.
    #[must_use]
    pub fn no_defaults(&self) -> bool {
        self.no_defaults.unwrap_or(false)
    }

    /// Whether unknown object keys are stripped.
    #[must_use]
    pub fn strip_unknown_objects(&self) -> bool {
        self.strip_unknown.is_some_and(|s| s.objects)
    }

    /// Whether unmatched array elements are stripped.
    #[must_use]
    pub fn strip_unknown_arrays(&self) -> bool {
        self.strip_unknown.is_some_and(|s| s.arrays)
    }

    /// Layer another options set over this one; the other side wins where
    /// it is set. Language maps merge key-wise, context is call-scoped.
    #[must_use]
    pub fn merged_with(&self, other: &ValidationOptions) -> ValidationOptions {
        let language = match (&self.language, &other.language) {
            (None, None) => None,
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (Some(a), Some(b)) => {
                let mut merged = a.clone();
                for (code, template) in b {
                    merged.insert(code.clone(), template.clone());
                }
                Some(merged)
            }
        };

        ValidationOptions {
            convert: other.convert.or(self.convert),
            abort_early: other.abort_early.or(self.abort_early),
            allow_unknown: other.allow_unknown.or(self.allow_unknown),
            strip_unknown: other.strip_unknown.or(self.strip_unknown),
            no_defaults: other.no_defaults.or(self.no_defaults),
            presence: other.presence.or(self.presence),
            context: other.context.clone().or_else(|| self.context.clone()),
            language,
        }
    }

    /// Describe the set fields (for schema describe output).
    pub(crate) fn describe(&self) -> Option<Value> {
        let mut out = IndexMap::new();
        if let Some(convert) = self.convert {
            out.insert("convert".to_string(), Value::Bool(convert));
        }
        if let Some(abort_early) = self.abort_early {
            out.insert("abortEarly".to_string(), Value::Bool(abort_early));
        }
        if let Some(allow_unknown) = self.allow_unknown {
            out.insert("allowUnknown".to_string(), Value::Bool(allow_unknown));
        }
        if let Some(strip) = self.strip_unknown {
            let mut shape = IndexMap::new();
            shape.insert("arrays".to_string(), Value::Bool(strip.arrays));
            shape.insert("objects".to_string(), Value::Bool(strip.objects));
            out.insert("stripUnknown".to_string(), Value::Object(shape));
        }
        if let Some(no_defaults) = self.no_defaults {
            out.insert("noDefaults".to_string(), Value::Bool(no_defaults));
        }
        if let Some(presence) = self.presence {
            out.insert(
                "presence".to_string(),
                Value::String(presence.as_str().to_string()),
            );
        }
        if out.is_empty() {
            None
        } else {
            Some(Value::Object(out))
        }
    }
}

/// Result of a validate call: the (possibly coerced) value alongside the
/// aggregate error, either of which may be absent.
#[derive(Debug)]
pub struct Validated {
    /// Coerced output value (partial when validation failed)
    pub value: Option<Value>,
    /// Aggregate failure, when any check failed
    pub error: Option<ValidationError>,
}

impl Validated {
    /// Convert into a `Result`, discarding the partial value on failure.
    pub fn into_result(self) -> Result<Option<Value>, ValidationError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

/// Drive the executor for one (schema, value, options) triple.
pub(crate) fn validate_schema(
    schema: &Schema,
    value: Option<Value>,
    options: &ValidationOptions,
) -> Validated {
    tracing::debug!(schema = schema.type_name(), "validate");

    let mut executor = Executor::new();
    let state = State::root();
    let outcome = executor.validate(schema, value, &state, options, None, true);

    if let Some(replaced) = executor.replaced {
        return Validated {
            value: outcome.value,
            error: Some(replaced),
        };
    }

    if outcome.errors.is_empty() {
        return Validated {
            value: outcome.value,
            error: None,
        };
    }

    let mut message = errors::compose_message(&outcome.errors);
    let mut details = errors::flatten(&outcome.errors);

    // The root node's hook runs last, over the flattened list.
    if let Some(hook) = &schema.inner.flags.error {
        let label = schema
            .inner
            .flags
            .label
            .clone()
            .unwrap_or_else(|| crate::language::DEFAULT_LABEL.to_string());
        match errors::apply_hook(hook, details, &[], &label) {
            Ok(rewritten) => {
                if let [only] = rewritten.as_slice() {
                    message = only.message.clone();
                }
                details = errors::flatten(&rewritten);
            }
            Err(replacement) => {
                return Validated {
                    value: outcome.value,
                    error: Some(replacement),
                };
            }
        }
    }

    Validated {
        value: outcome.value,
        error: Some(ValidationError { message, details }),
    }
}
