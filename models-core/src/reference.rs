//! Deferred path references
//!
//! A [`Reference`] names a value by path instead of holding it, and is
//! resolved lazily at validate time: either against the object enclosing the
//! key being validated (sibling/ancestor lookup) or against the out-of-band
//! context object when the key carries the context prefix.

use crate::value::Value;
use serde::ser::{Serialize, Serializer};
use std::fmt;

/// Construction options for [`Reference`].
#[derive(Debug, Clone, Default)]
pub struct RefOptions {
    /// Path separator, `.` when unset
    pub separator: Option<char>,
    /// Prefix marking a context reference, `$` when unset
    pub context_prefix: Option<String>,
}

/// A deferred lookup against sibling data or the validation context.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    key: String,
    path: Vec<String>,
    separator: char,
    is_context: bool,
}

impl Reference {
    /// Create a reference with default options.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_options(key, RefOptions::default())
    }

    /// Create a reference, honoring a custom separator and context prefix.
    #[must_use]
    pub fn with_options(key: impl Into<String>, options: RefOptions) -> Self {
        let raw = key.into();
        let separator = options.separator.unwrap_or('.');
        let prefix = options.context_prefix.unwrap_or_else(|| "$".to_string());

        let (is_context, key) = match raw.strip_prefix(prefix.as_str()) {
            Some(rest) => (true, rest.to_string()),
            None => (false, raw),
        };

        let path = key.split(separator).map(String::from).collect();
        Self {
            key,
            path,
            separator,
            is_context,
        }
    }

    /// The path with the context prefix removed.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// First path segment, computed at construction.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.path[0]
    }

    /// Whether this resolves against the context object.
    #[must_use]
    pub fn is_context(&self) -> bool {
        self.is_context
    }

    /// Path separator in effect.
    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Resolve against the enclosing object (or context object).
    ///
    /// `parent` is the object directly containing the key being validated,
    /// not necessarily the root of the call. A miss yields `None`; deciding
    /// what a missing referent means is the caller's business.
    #[must_use]
    pub fn resolve(&self, parent: Option<&Value>, context: Option<&Value>) -> Option<Value> {
        let target = if self.is_context { context } else { parent };
        target.and_then(|v| v.lookup(&self.path)).cloned()
    }

    /// Serialized form used by describe output and error messages.
    #[must_use]
    pub fn display_path(&self) -> String {
        if self.is_context {
            format!("context:{}", self.key)
        } else {
            format!("ref:{}", self.key)
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_path())
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn resolves_against_parent() {
        let parent = Value::from(json!({"a": {"b": 42}}));
        let reference = Reference::new("a.b");
        assert_eq!(reference.root(), "a");
        assert_eq!(
            reference.resolve(Some(&parent), None),
            Some(Value::Number(42.0))
        );
    }

    #[test]
    fn resolves_against_context() {
        let context = Value::from(json!({"x": "yes"}));
        let reference = Reference::new("$x");
        assert!(reference.is_context());
        assert_eq!(
            reference.resolve(None, Some(&context)),
            Some(Value::String("yes".to_string()))
        );
        assert_eq!(reference.display_path(), "context:x");
    }

    #[test]
    fn custom_separator_splits_path() {
        let parent = Value::from(json!({"a.b": {"c": 1}}));
        let reference = Reference::with_options(
            "a.b/c",
            RefOptions {
                separator: Some('/'),
                context_prefix: None,
            },
        );
        assert_eq!(
            reference.resolve(Some(&parent), None),
            Some(Value::Number(1.0))
        );
    }

    #[test]
    fn missing_referent_is_absent_not_error() {
        let parent = Value::from(json!({"a": 1}));
        assert_eq!(Reference::new("b.c").resolve(Some(&parent), None), None);
    }
}
