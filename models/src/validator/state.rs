//! Per-call validation state
//!
//! State is ephemeral and threaded through the recursion by value: the
//! current path, and the chain of ancestor values (closest enclosing object
//! first) that reference resolution walks. Array positions extend the path
//! but not the ancestor chain, so references inside item schemas resolve
//! against the array's enclosing object.

use super::errors::PathSeg;
use models_core::Value;

#[derive(Clone, Debug, Default)]
pub(crate) struct State {
    pub path: Vec<PathSeg>,
    /// Enclosing values, closest first. The head is the object references
    /// resolve against.
    pub ancestors: Vec<Value>,
    /// Set for direct object children: the enclosing object pass applies
    /// defaults itself, after every sibling has been validated.
    pub defer_defaults: bool,
}

impl State {
    pub fn root() -> Self {
        Self::default()
    }

    /// The object directly containing the value being validated.
    pub fn parent(&self) -> Option<&Value> {
        self.ancestors.first()
    }

    /// State for an object child: path gains the key, the (in-progress)
    /// parent object heads the ancestor chain.
    pub fn for_key(&self, key: &str, parent: Value) -> State {
        let mut path = self.path.clone();
        path.push(PathSeg::Key(key.to_string()));

        let mut ancestors = Vec::with_capacity(self.ancestors.len() + 1);
        ancestors.push(parent);
        ancestors.extend(self.ancestors.iter().cloned());

        State {
            path,
            ancestors,
            defer_defaults: true,
        }
    }

    /// State for an array element: path gains the position, ancestors are
    /// unchanged.
    pub fn for_index(&self, index: usize) -> State {
        let mut path = self.path.clone();
        path.push(PathSeg::Index(index));
        State {
            path,
            ancestors: self.ancestors.clone(),
            defer_defaults: false,
        }
    }

    /// Key or position of the current value within its parent.
    pub fn key(&self) -> Option<&PathSeg> {
        self.path.last()
    }
}
