//! Boolean conversion tables
//!
//! Boolean nodes convert strings through truthy/falsy tables. The built-in
//! tables accept `"true"` and `"false"`; `truthy()`/`falsy()` extend them
//! with custom markers, matched case-insensitively under `insensitive()`.

use super::{Kind, Schema};
use models_core::Value;

impl Schema {
    /// Add values converted to `true`.
    ///
    /// # Panics
    ///
    /// On non-boolean nodes.
    #[must_use]
    pub fn truthy<I, V>(&self, values: I) -> Schema
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.guard(&["boolean"], "truthy");
        self.map(|i| {
            if let Kind::Boolean(kind) = &mut i.kind {
                kind.truthy.extend(values.into_iter().map(Into::into));
            }
        })
    }

    /// Add values converted to `false`.
    ///
    /// # Panics
    ///
    /// On non-boolean nodes.
    #[must_use]
    pub fn falsy<I, V>(&self, values: I) -> Schema
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.guard(&["boolean"], "falsy");
        self.map(|i| {
            if let Kind::Boolean(kind) = &mut i.kind {
                kind.falsy.extend(values.into_iter().map(Into::into));
            }
        })
    }
}
