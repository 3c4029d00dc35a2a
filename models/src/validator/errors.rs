//! Failure details and aggregate error assembly
//!
//! The executor produces a *tree* of details: wrapping codes such as
//! `object.child` and `array.includesOne` hold the failures of a child
//! subtree in their context's `reason` list and exist for message
//! composition only. At aggregation the tree is flattened to its leaves; a
//! detail of code `override` is a flattening boundary, except for
//! message-only overrides which keep their original leaves.

use crate::schema::ErrorOverride;
use indexmap::IndexMap;
use models_core::Value;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Code of details produced by error-override hooks.
pub const OVERRIDE_CODE: &str = "override";

/// One step of a failure path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSeg {
    /// Object key
    Key(String),
    /// Array position
    Index(usize),
}

impl PathSeg {
    /// The segment as a context value (string key or numeric index).
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            PathSeg::Key(k) => Value::String(k.clone()),
            PathSeg::Index(i) => Value::from(*i),
        }
    }
}

impl fmt::Display for PathSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSeg::Key(k) => write!(f, "{k}"),
            PathSeg::Index(i) => write!(f, "{i}"),
        }
    }
}

impl Serialize for PathSeg {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathSeg::Key(k) => serializer.serialize_str(k),
            PathSeg::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

/// Context carried by a failure detail: everything needed to re-render its
/// message.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    /// Display name of the failing node
    pub label: String,
    /// Key or position of the failing value within its parent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    /// Code-specific data (limits, offending value, peers, ...)
    #[serde(flatten)]
    pub extras: IndexMap<String, Value>,
    /// Wrapped child failures (wrapping codes only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reason: Vec<Detail>,
}

/// A single failure, addressed by path and coded by failure class.
#[derive(Debug, Clone, Serialize)]
pub struct Detail {
    /// Rendered message
    pub message: String,
    /// Path from the root to the failing value
    pub path: Vec<PathSeg>,
    /// Dotted failure class, unique per check (`"any.required"`, ...)
    #[serde(rename = "type")]
    pub code: String,
    /// Message-rendering data
    pub context: Context,
    /// Message-only override: flattening keeps the wrapped leaves
    #[serde(skip)]
    pub(crate) message_only: bool,
}

/// Result of an error-override hook.
pub enum Override {
    /// Use this detail list (returning the input unchanged is a no-op)
    Details(Vec<Detail>),
    /// Collapse the composed message to a fixed string, keeping the
    /// original details
    Message(String),
    /// Replace the node's details with a single `override` detail
    Descriptor {
        /// Message of the override detail
        message: String,
        /// Context data merged into the override detail
        context: IndexMap<String, Value>,
    },
    /// Replace the aggregate error entirely, dropping all details
    Error(ValidationError),
}

/// Aggregate validation failure: a composed message plus the ordered list
/// of leaf details.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ValidationError {
    /// Recursive `child "k" fails because [...]` composition
    pub message: String,
    /// Flattened, ordered leaf details
    pub details: Vec<Detail>,
}

impl ValidationError {
    /// Build an error with a plain message and no details.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }
}

/// Flatten a detail tree to its leaves.
pub(crate) fn flatten(details: &[Detail]) -> Vec<Detail> {
    let mut out = Vec::new();
    for detail in details {
        collect(detail, &mut out);
    }
    out
}

fn collect(detail: &Detail, out: &mut Vec<Detail>) {
    if detail.message_only {
        for reason in &detail.context.reason {
            collect(reason, out);
        }
    } else if detail.code == OVERRIDE_CODE || detail.context.reason.is_empty() {
        out.push(detail.clone());
    } else {
        for reason in &detail.context.reason {
            collect(reason, out);
        }
    }
}

/// Compose the aggregate message from the top of the detail tree.
pub(crate) fn compose_message(tree: &[Detail]) -> String {
    tree.iter()
        .map(|d| d.message.clone())
        .collect::<Vec<_>>()
        .join(". ")
}

/// Apply a node-level override hook to a node's detail tree.
///
/// Returns the rewritten tree, or the replacement error when the hook
/// discards details entirely.
pub(crate) fn apply_hook(
    hook: &ErrorOverride,
    details: Vec<Detail>,
    path: &[PathSeg],
    label: &str,
) -> Result<Vec<Detail>, ValidationError> {
    match hook {
        ErrorOverride::Message(message) => Ok(vec![message_only_detail(
            message.clone(),
            details,
            path,
            label,
        )]),
        ErrorOverride::With(f) => match f(details.clone()) {
            Override::Details(rewritten) => Ok(rewritten),
            Override::Message(message) => {
                Ok(vec![message_only_detail(message, details, path, label)])
            }
            Override::Descriptor { message, context } => Ok(vec![Detail {
                message,
                path: path.to_vec(),
                code: OVERRIDE_CODE.to_string(),
                context: Context {
                    label: label.to_string(),
                    key: path.last().map(PathSeg::to_value),
                    extras: context,
                    reason: Vec::new(),
                },
                message_only: false,
            }]),
            Override::Error(err) => Err(err),
        },
    }
}

fn message_only_detail(
    message: String,
    details: Vec<Detail>,
    path: &[PathSeg],
    label: &str,
) -> Detail {
    Detail {
        message,
        path: path.to_vec(),
        code: OVERRIDE_CODE.to_string(),
        context: Context {
            label: label.to_string(),
            key: path.last().map(PathSeg::to_value),
            extras: IndexMap::new(),
            reason: details,
        },
        message_only: true,
    }
}
