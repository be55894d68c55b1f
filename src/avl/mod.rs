//! AVL Index Module
//!
//! A balanced binary search tree whose nodes live in a [`ByteStore`].
//!
//! ## Responsibilities
//! - Insert/overwrite, delete and point lookup by key
//! - Keep every node's balance factor in {-1, 0, 1} via rotations
//! - Descending traversal and budgeted top-N without a full scan
//! - Structural self-check of cached heights, balance and parent links
//!
//! ## Key Space (per tree prefix `P`)
//! ```text
//! P#root       → NodeId of the root (tombstone when the tree is empty)
//! P#seq        → last allocated NodeId
//! P#n{id}      → TreeNode record
//! ```
//!
//! No node graph is cached between calls: every operation re-reads the
//! records it touches by id. Node records are never reclaimed; a deleted
//! node is unlinked from its parent and becomes unreachable.
//!
//! ## Concurrency
//! One writer per tree. Two overlapping mutations on the same prefix can
//! leave heights and links inconsistent; serialize them with
//! [`ScopeLocks`](crate::lock::ScopeLocks).

mod check;
mod rebalance;
mod traverse;

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{NodeId, TreeNode};
use crate::error::{ArborError, Result};
use crate::store::{composite_key, ByteStore, Records};

const ROOT_SUFFIX: &[u8] = b"#root";
const SEQ_SUFFIX: &[u8] = b"#seq";
const NODE_SUFFIX: &[u8] = b"#n";

/// Persistent AVL tree over a byte store
pub struct AvlTree<S, K, V> {
    records: Records<S>,

    /// Namespace for every record of this tree
    prefix: Vec<u8>,

    /// Run `self_check` after each mutation and log failures
    verify_writes: bool,

    _marker: PhantomData<fn() -> (K, V)>,
}

impl<S, K, V> Clone for AvlTree<S, K, V> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            prefix: self.prefix.clone(),
            verify_writes: self.verify_writes,
            _marker: PhantomData,
        }
    }
}

impl<S, K, V> AvlTree<S, K, V>
where
    S: ByteStore,
    K: Ord + Serialize + DeserializeOwned + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    /// Bind a tree to `prefix` in `store`
    ///
    /// The prefix must not collide with any other tree's or set's keys.
    pub fn new(store: Arc<S>, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            records: Records::new(store),
            prefix: prefix.into(),
            verify_writes: false,
            _marker: PhantomData,
        }
    }

    /// Enable or disable post-mutation self-checks
    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_writes = enabled;
        self
    }

    /// Insert or overwrite `key`
    ///
    /// Returns `true` iff the key was not present before.
    pub async fn insert(&self, key: K, value: V) -> Result<bool> {
        let added = self.insert_node(key, value).await?;
        self.verify_after("insert").await?;
        Ok(added)
    }

    /// Remove `key`
    ///
    /// Returns `false` if the key was absent; the tree is left untouched.
    pub async fn delete(&self, key: &K) -> Result<bool> {
        let removed = self.delete_node(key).await?;
        if removed {
            self.verify_after("delete").await?;
        }
        Ok(removed)
    }

    /// Look up the value stored under `key`
    pub async fn get(&self, key: &K) -> Result<Option<V>> {
        Ok(self.find(key).await?.map(|node| node.value))
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.root_id().await?.is_none())
    }

    /// Height of the tree: -1 when empty, 0 for a single node
    pub async fn height(&self) -> Result<i32> {
        match self.root_id().await? {
            Some(root) => Ok(self.load_node(root).await?.height()),
            None => Ok(-1),
        }
    }

    /// The tree's key prefix
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    async fn insert_node(&self, key: K, value: V) -> Result<bool> {
        let Some(root) = self.root_id().await? else {
            let id = self.allocate_id().await?;
            self.save_node(&TreeNode::leaf(id, key, value, None)).await?;
            self.set_root(Some(id)).await?;
            tracing::debug!("Tree {}: created root node {}", self.name(), id);
            return Ok(true);
        };

        // Descend to the node that will become the new leaf's parent
        let mut parent = self.load_node(root).await?;
        let attach_left = loop {
            let next = match key.cmp(&parent.key) {
                Ordering::Equal => {
                    parent.value = value;
                    self.save_node(&parent).await?;
                    return Ok(false);
                }
                Ordering::Less => match parent.left {
                    Some(id) => id,
                    None => break true,
                },
                Ordering::Greater => match parent.right {
                    Some(id) => id,
                    None => break false,
                },
            };
            parent = self.load_node(next).await?;
        };

        let id = self.allocate_id().await?;
        self.save_node(&TreeNode::leaf(id, key, value, Some(parent.id)))
            .await?;

        if attach_left {
            parent.left = Some(id);
            parent.height_left = 0;
        } else {
            parent.right = Some(id);
            parent.height_right = 0;
        }
        tracing::trace!("Tree {}: attached node {} under {}", self.name(), id, parent.id);

        self.retrace(parent).await?;
        Ok(true)
    }

    async fn delete_node(&self, key: &K) -> Result<bool> {
        let Some(mut target) = self.find(key).await? else {
            return Ok(false);
        };

        // In-order predecessor if there is a left subtree, else successor
        let replacement = match (target.left, target.right) {
            (Some(left), _) => self.extreme(left, |node| node.right).await?,
            (None, Some(right)) => self.extreme(right, |node| node.left).await?,
            (None, None) => {
                self.unlink(target.id, target.parent, None).await?;
                return Ok(true);
            }
        };

        // Predecessor/successor has at most one child, on the inner side
        let orphan = replacement.sole_child();
        let TreeNode {
            key: moved_key,
            value: moved_value,
            id: moved_id,
            parent: moved_parent,
            ..
        } = replacement;

        target.key = moved_key;
        target.value = moved_value;
        self.save_node(&target).await?;
        tracing::debug!(
            "Tree {}: node {} replaced by contents of node {}",
            self.name(),
            target.id,
            moved_id
        );

        self.unlink(moved_id, moved_parent, orphan).await?;
        Ok(true)
    }

    /// Detach node `id` (which has at most the one child `child`) from
    /// `parent`, hoisting the child into its slot, then rebalance upward.
    async fn unlink(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        child: Option<NodeId>,
    ) -> Result<()> {
        let child_height = match child {
            Some(child_id) => {
                let mut child_node = self.load_node(child_id).await?;
                child_node.parent = parent;
                self.save_node(&child_node).await?;
                child_node.height()
            }
            None => -1,
        };

        let Some(parent_id) = parent else {
            // Removing the root: its child (if any) takes over, else tombstone
            self.set_root(child).await?;
            tracing::debug!("Tree {}: root node {} removed", self.name(), id);
            return Ok(());
        };

        let mut parent_node = self.load_node(parent_id).await?;
        if parent_node.left == Some(id) {
            parent_node.left = child;
            parent_node.height_left = child_height;
        } else if parent_node.right == Some(id) {
            parent_node.right = child;
            parent_node.height_right = child_height;
        } else {
            return Err(ArborError::Corruption(format!(
                "node {} is not a child of its recorded parent {}",
                id, parent_id
            )));
        }

        self.retrace(parent_node).await
    }

    /// Follow `step` from `start` until it runs out
    async fn extreme(
        &self,
        start: NodeId,
        step: impl Fn(&TreeNode<K, V>) -> Option<NodeId>,
    ) -> Result<TreeNode<K, V>> {
        let mut node = self.load_node(start).await?;
        while let Some(next) = step(&node) {
            node = self.load_node(next).await?;
        }
        Ok(node)
    }

    async fn find(&self, key: &K) -> Result<Option<TreeNode<K, V>>> {
        let mut next = self.root_id().await?;
        while let Some(id) = next {
            let node = self.load_node(id).await?;
            next = match key.cmp(&node.key) {
                Ordering::Equal => return Ok(Some(node)),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        Ok(None)
    }

    async fn verify_after(&self, operation: &str) -> Result<()> {
        if self.verify_writes && !self.self_check().await? {
            tracing::warn!(
                "Tree {}: self-check failed after {}",
                self.name(),
                operation
            );
        }
        Ok(())
    }

    // =========================================================================
    // Record Access
    // =========================================================================

    async fn root_id(&self) -> Result<Option<NodeId>> {
        self.records.load(&self.root_key()).await
    }

    async fn set_root(&self, root: Option<NodeId>) -> Result<()> {
        match root {
            Some(id) => self.records.save(&self.root_key(), &id).await,
            None => self.records.erase(&self.root_key()).await,
        }
    }

    async fn allocate_id(&self) -> Result<NodeId> {
        let key = composite_key(&self.prefix, SEQ_SUFFIX);
        let last: u64 = self.records.load(&key).await?.unwrap_or(0);
        let next = last + 1;
        self.records.save(&key, &next).await?;
        Ok(NodeId(next))
    }

    async fn load_node(&self, id: NodeId) -> Result<TreeNode<K, V>> {
        self.records
            .load(&self.node_key(id))
            .await?
            .ok_or_else(|| {
                ArborError::Corruption(format!(
                    "tree {} references missing node {}",
                    self.name(),
                    id
                ))
            })
    }

    async fn save_node(&self, node: &TreeNode<K, V>) -> Result<()> {
        self.records.save(&self.node_key(node.id), node).await
    }

    fn root_key(&self) -> Vec<u8> {
        composite_key(&self.prefix, ROOT_SUFFIX)
    }

    fn node_key(&self, id: NodeId) -> Vec<u8> {
        let mut key = composite_key(&self.prefix, NODE_SUFFIX);
        key.extend_from_slice(id.to_string().as_bytes());
        key
    }

    fn name(&self) -> String {
        String::from_utf8_lossy(&self.prefix).into_owned()
    }
}
