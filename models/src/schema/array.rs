//! Array item composition
//!
//! Arrays carry an unordered item-schema list (each element must match one;
//! `required()` items are tracked across the whole array, `forbidden()`
//! items act as exclusions, `strip()` items match-and-discard) and an
//! optional positional tuple list (`ordered`).

use super::{Kind, Schema, UniqueRule};

impl Schema {
    /// Add item schemas every element is matched against, in declaration
    /// order.
    ///
    /// # Panics
    ///
    /// On non-array nodes.
    #[must_use]
    pub fn items<I>(&self, schemas: I) -> Schema
    where
        I: IntoIterator<Item = Schema>,
    {
        self.guard(&["array"], "items");
        self.map(|i| {
            if let Kind::Array(kind) = &mut i.kind {
                kind.items.extend(schemas);
            }
        })
    }

    /// Add positional schemas for the leading elements.
    ///
    /// # Panics
    ///
    /// On non-array nodes.
    #[must_use]
    pub fn ordered<I>(&self, schemas: I) -> Schema
    where
        I: IntoIterator<Item = Schema>,
    {
        self.guard(&["array"], "ordered");
        self.map(|i| {
            if let Kind::Array(kind) = &mut i.kind {
                kind.ordered.extend(schemas);
            }
        })
    }

    /// Permit elements that validated to an absent value.
    ///
    /// # Panics
    ///
    /// On non-array nodes.
    #[must_use]
    pub fn sparse(&self) -> Schema {
        self.guard(&["array"], "sparse");
        if matches!(&self.inner.kind, Kind::Array(k) if k.sparse) {
            return self.clone();
        }
        self.map(|i| {
            if let Kind::Array(kind) = &mut i.kind {
                kind.sparse = true;
            }
        })
    }

    /// Wrap a bare non-array value into a single-element array before
    /// validation. Failures inside a wrapped value report the
    /// `*Single` variants.
    ///
    /// # Panics
    ///
    /// On non-array nodes.
    #[must_use]
    pub fn single(&self) -> Schema {
        self.guard(&["array"], "single");
        if matches!(&self.inner.kind, Kind::Array(k) if k.single) {
            return self.clone();
        }
        self.map(|i| {
            if let Kind::Array(kind) = &mut i.kind {
                kind.single = true;
            }
        })
    }

    /// Reject duplicate elements (deep equality).
    ///
    /// # Panics
    ///
    /// On non-array nodes.
    #[must_use]
    pub fn unique(&self) -> Schema {
        self.guard(&["array"], "unique");
        self.map(|i| {
            if let Kind::Array(kind) = &mut i.kind {
                kind.unique = Some(UniqueRule { by: None });
            }
        })
    }

    /// Reject elements whose value at the given dotted path duplicates an
    /// earlier element's.
    ///
    /// # Panics
    ///
    /// On non-array nodes.
    #[must_use]
    pub fn unique_by(&self, path: impl Into<String>) -> Schema {
        self.guard(&["array"], "unique");
        let by = path.into();
        self.map(|i| {
            if let Kind::Array(kind) = &mut i.kind {
                kind.unique = Some(UniqueRule { by: Some(by) });
            }
        })
    }
}
