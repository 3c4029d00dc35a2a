//! Object key composition, dependencies and renames

use super::{Dependency, Kind, Rename, Schema};
use crate::cast::{self, Raw};
use indexmap::IndexMap;
use models_core::Reference;

/// Options for [`Schema::rename`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameOptions {
    /// Keep the original key alongside the renamed one
    pub alias: bool,
    /// Allow several keys to be renamed to the same target
    pub multiple: bool,
    /// Allow the rename to overwrite an existing target key
    pub override_existing: bool,
    /// Skip the rename when the source key is absent
    pub ignore_undefined: bool,
}

impl Schema {
    /// Declare child schemas, merged over any existing declarations.
    ///
    /// A node that never declared keys accepts any key; declaring an empty
    /// set makes it strict.
    ///
    /// # Panics
    ///
    /// On non-object nodes.
    #[must_use]
    pub fn keys<I, K, R>(&self, children: I) -> Schema
    where
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
        R: Into<Raw>,
    {
        self.guard(&["object"], "keys");
        let compiled: IndexMap<String, Schema> = children
            .into_iter()
            .map(|(k, raw)| (k.into(), cast::compile(raw.into())))
            .collect();
        self.map(|i| {
            if let Kind::Object(kind) = &mut i.kind {
                match &mut kind.children {
                    Some(existing) => existing.extend(compiled),
                    None => kind.children = Some(compiled),
                }
            }
        })
    }

    /// Allow (or re-forbid) keys with no declared schema.
    ///
    /// # Panics
    ///
    /// On non-object nodes.
    #[must_use]
    pub fn unknown(&self, allow: bool) -> Schema {
        self.guard(&["object"], "unknown");
        self.map(|i| {
            let mut settings = i.settings.clone().unwrap_or_default();
            settings.allow_unknown = Some(allow);
            i.settings = Some(settings);
        })
    }

    /// Require the listed peers to appear all together or not at all.
    ///
    /// # Panics
    ///
    /// On non-object nodes.
    #[must_use]
    pub fn and<I, S>(&self, peers: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard(&["object"], "and");
        let peers: Vec<String> = peers.into_iter().map(Into::into).collect();
        self.map(|i| {
            if let Kind::Object(kind) = &mut i.kind {
                kind.dependencies.push(Dependency::And(peers));
            }
        })
    }

    /// Require at least one of the listed peers.
    ///
    /// # Panics
    ///
    /// On non-object nodes.
    #[must_use]
    pub fn or<I, S>(&self, peers: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard(&["object"], "or");
        let peers: Vec<String> = peers.into_iter().map(Into::into).collect();
        self.map(|i| {
            if let Kind::Object(kind) = &mut i.kind {
                kind.dependencies.push(Dependency::Or(peers));
            }
        })
    }

    /// When `key` is present, require every listed peer.
    ///
    /// # Panics
    ///
    /// On non-object nodes.
    #[must_use]
    pub fn with<I, S>(&self, key: impl Into<String>, peers: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard(&["object"], "with");
        let key = key.into();
        let peers: Vec<String> = peers.into_iter().map(Into::into).collect();
        self.map(|i| {
            if let Kind::Object(kind) = &mut i.kind {
                kind.dependencies.push(Dependency::With { key, peers });
            }
        })
    }

    /// When `key` is present, forbid every listed peer.
    ///
    /// # Panics
    ///
    /// On non-object nodes.
    #[must_use]
    pub fn without<I, S>(&self, key: impl Into<String>, peers: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard(&["object"], "without");
        let key = key.into();
        let peers: Vec<String> = peers.into_iter().map(Into::into).collect();
        self.map(|i| {
            if let Kind::Object(kind) = &mut i.kind {
                kind.dependencies.push(Dependency::Without { key, peers });
            }
        })
    }

    /// Assert that the referenced value validates against a schema after
    /// the object's own keys have been validated.
    ///
    /// # Panics
    ///
    /// On non-object nodes.
    #[must_use]
    pub fn assert(
        &self,
        reference: Reference,
        schema: Schema,
        message: Option<String>,
    ) -> Schema {
        self.guard(&["object"], "assert");
        self.map(|i| {
            if let Kind::Object(kind) = &mut i.kind {
                kind.dependencies.push(Dependency::Assert {
                    reference: reference.clone(),
                    schema: schema.clone(),
                    message: message.clone(),
                });
            }
        })
    }

    /// Rename a key before child validation.
    ///
    /// # Panics
    ///
    /// On non-object nodes.
    #[must_use]
    pub fn rename(
        &self,
        from: impl Into<String>,
        to: impl Into<String>,
        options: RenameOptions,
    ) -> Schema {
        self.guard(&["object"], "rename");
        let rename = Rename {
            from: from.into(),
            to: to.into(),
            alias: options.alias,
            multiple: options.multiple,
            override_target: options.override_existing,
            ignore_undefined: options.ignore_undefined,
        };
        self.map(|i| {
            if let Kind::Object(kind) = &mut i.kind {
                kind.renames.push(rename.clone());
            }
        })
    }
}
