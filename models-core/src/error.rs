//! Construction-class errors
//!
//! These are raised while *building* a schema (bad builder arguments,
//! incompatible merges, malformed compile input) and always abort
//! immediately. Failures found while *validating* a value are data, not
//! errors, and live in the engine crate's reporting types.

use thiserror::Error;

/// Error raised by schema construction and option handling.
#[derive(Error, Debug)]
pub enum ModelsError {
    /// Invalid builder usage
    #[error("invalid schema construction: {message}")]
    Construction {
        /// What the caller did wrong
        message: String,
    },

    /// Merging two schemas of different base types
    #[error("cannot merge type {base} with another type: {other}")]
    TypeMismatch {
        /// Base type of the left-hand schema
        base: &'static str,
        /// Base type of the right-hand schema
        other: &'static str,
    },

    /// A rule received an argument it cannot use
    #[error("invalid argument for {rule}: {message}")]
    RuleArgument {
        /// Rule that rejected the argument
        rule: &'static str,
        /// Why the argument was rejected
        message: String,
    },

    /// Malformed input to schema compilation
    #[error("failed to compile schema: {message}")]
    Compile {
        /// Why the input could not be normalized
        message: String,
    },

    /// Invalid validation option value
    #[error("invalid validation options: {message}")]
    Options {
        /// Which option value was rejected
        message: String,
    },
}

/// Result type alias for construction operations.
pub type Result<T> = std::result::Result<T, ModelsError>;

impl ModelsError {
    /// Create a construction error.
    #[must_use]
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }

    /// Create a merge type-mismatch error.
    #[must_use]
    pub fn type_mismatch(base: &'static str, other: &'static str) -> Self {
        Self::TypeMismatch { base, other }
    }

    /// Create a rule-argument error.
    #[must_use]
    pub fn rule_argument(rule: &'static str, message: impl Into<String>) -> Self {
        Self::RuleArgument {
            rule,
            message: message.into(),
        }
    }

    /// Create a compile error.
    #[must_use]
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile {
            message: message.into(),
        }
    }

    /// Create an options error.
    #[must_use]
    pub fn options(message: impl Into<String>) -> Self {
        Self::Options {
            message: message.into(),
        }
    }
}
