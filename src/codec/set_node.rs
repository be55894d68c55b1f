//! Linked-set node record
//!
//! A set is a chain of records starting at its head, which is stored
//! under the set id itself. Element records live under `set_id ∥ key`.

use serde::{Deserialize, Serialize};

/// What a set record holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetEntry<V> {
    /// The head sentinel: carries no value
    Head,
    Element(V),
}

/// A serialized linked-set node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNode<V> {
    pub entry: SetEntry<V>,

    /// Record key of the following element
    pub next: Option<Vec<u8>>,

    /// Record key of the preceding record (the set id for the first element)
    pub previous: Option<Vec<u8>>,
}

impl<V> SetNode<V> {
    /// An empty set's head
    pub fn head() -> Self {
        Self {
            entry: SetEntry::Head,
            next: None,
            previous: None,
        }
    }

    pub fn element(value: V, next: Option<Vec<u8>>, previous: Option<Vec<u8>>) -> Self {
        Self {
            entry: SetEntry::Element(value),
            next,
            previous,
        }
    }

    pub fn is_head(&self) -> bool {
        matches!(self.entry, SetEntry::Head)
    }

    /// The element value, `None` for the head
    pub fn into_value(self) -> Option<V> {
        match self.entry {
            SetEntry::Head => None,
            SetEntry::Element(value) => Some(value),
        }
    }
}
