//! Core types for the models validation engine
//!
//! This crate holds the pieces shared by every consumer of the engine: the
//! runtime [`Value`] union, deferred [`Reference`] lookups, and the
//! construction-class [`ModelsError`]. The schema builders and the executor
//! live in the `models` crate.

pub mod error;
pub mod reference;
pub mod value;

pub use error::{ModelsError, Result};
pub use reference::{RefOptions, Reference};
pub use value::{Value, deep_equal};
