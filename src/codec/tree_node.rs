//! Tree node record
//!
//! One AVL node as it lives in the byte store. Links are ids, never
//! in-memory references; `None` means "no parent" / "no child".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node within one tree's namespace.
///
/// Allocated from a persisted per-tree counter starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A serialized AVL node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode<K, V> {
    pub key: K,
    pub value: V,
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,

    /// Cached height of the left subtree, -1 when absent
    pub height_left: i32,

    /// Cached height of the right subtree, -1 when absent
    pub height_right: i32,

    /// Cached `height_left - height_right`
    pub balance: i32,
}

impl<K, V> TreeNode<K, V> {
    /// A fresh node with no children
    pub fn leaf(id: NodeId, key: K, value: V, parent: Option<NodeId>) -> Self {
        Self {
            key,
            value,
            id,
            parent,
            left: None,
            right: None,
            height_left: -1,
            height_right: -1,
            balance: 0,
        }
    }

    /// Height of the subtree rooted here (0 for a leaf)
    pub fn height(&self) -> i32 {
        self.height_left.max(self.height_right) + 1
    }

    /// Recompute the cached balance factor from the cached heights
    pub fn refresh_balance(&mut self) {
        self.balance = self.height_left - self.height_right;
    }

    /// The only child of a node with at most one child
    pub fn sole_child(&self) -> Option<NodeId> {
        self.left.or(self.right)
    }
}
