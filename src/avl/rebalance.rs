//! Rebalancing
//!
//! Height propagation and rotations. Every participant of a rotation is
//! addressed by id, so each step is a handful of record reads and writes.
//!
//! ```text
//!   rotate_left(x)            rotate_right(x)
//!
//!     x                y          x              y
//!    / \              / \        / \            / \
//!   a   y     →      x   c      y   c    →     a   x
//!      / \          / \        / \                / \
//!     b   c        a   b      a   b              b   c
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{NodeId, TreeNode};
use crate::error::{ArborError, Result};
use crate::store::ByteStore;

use super::AvlTree;

impl<S, K, V> AvlTree<S, K, V>
where
    S: ByteStore,
    K: Ord + Serialize + DeserializeOwned + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    /// Persist `node` (whose cached child heights are current) and walk up,
    /// rotating where a balance factor reaches ±2 and refreshing each
    /// ancestor's cached height, until an ancestor's cached height is
    /// already correct or the root has been handled.
    pub(super) async fn retrace(&self, mut node: TreeNode<K, V>) -> Result<()> {
        loop {
            node.refresh_balance();
            if node.balance.abs() > 1 {
                node = self.rotate(node).await?;
            } else {
                self.save_node(&node).await?;
            }

            let Some(parent_id) = node.parent else {
                return Ok(());
            };

            let mut parent = self.load_node(parent_id).await?;
            let height = node.height();
            let cached = if parent.left == Some(node.id) {
                &mut parent.height_left
            } else if parent.right == Some(node.id) {
                &mut parent.height_right
            } else {
                return Err(ArborError::Corruption(format!(
                    "node {} is not a child of its recorded parent {}",
                    node.id, parent_id
                )));
            };

            if *cached == height {
                return Ok(());
            }
            *cached = height;
            node = parent;
        }
    }

    /// Restore balance at `node` (balance ±2). Returns the new subtree root,
    /// already saved and linked into `node`'s former parent slot.
    async fn rotate(&self, mut node: TreeNode<K, V>) -> Result<TreeNode<K, V>> {
        let parent = node.parent;
        let old_root = node.id;

        let top = if node.balance < 0 {
            // Right-heavy
            let mut pivot = self.load_node(required(node.right, node.id)?).await?;
            if pivot.balance > 0 {
                // Right-left case: straighten the right subtree first
                let mut inner = self.load_node(required(pivot.left, pivot.id)?).await?;
                self.rotate_right(&mut pivot, &mut inner).await?;
                self.save_node(&pivot).await?;
                node.right = Some(inner.id);
                node.height_right = inner.height();
                pivot = inner;
            }
            self.rotate_left(&mut node, &mut pivot).await?;
            pivot
        } else {
            // Left-heavy
            let mut pivot = self.load_node(required(node.left, node.id)?).await?;
            if pivot.balance < 0 {
                // Left-right case
                let mut inner = self.load_node(required(pivot.right, pivot.id)?).await?;
                self.rotate_left(&mut pivot, &mut inner).await?;
                self.save_node(&pivot).await?;
                node.left = Some(inner.id);
                node.height_left = inner.height();
                pivot = inner;
            }
            self.rotate_right(&mut node, &mut pivot).await?;
            pivot
        };

        self.save_node(&node).await?;
        self.save_node(&top).await?;
        self.replace_child(parent, old_root, top.id).await?;

        tracing::debug!(
            "Tree {}: rotated node {} under node {}",
            self.name(),
            old_root,
            top.id
        );
        Ok(top)
    }

    /// Lift `pivot` (the right child of `node`) above `node`.
    ///
    /// Updates both records in memory; only the moved inner subtree is
    /// written here. The caller saves `node` and `pivot`.
    async fn rotate_left(
        &self,
        node: &mut TreeNode<K, V>,
        pivot: &mut TreeNode<K, V>,
    ) -> Result<()> {
        let inner = pivot.left;
        node.right = inner;
        node.height_right = pivot.height_left;
        if let Some(id) = inner {
            self.reparent(id, node.id).await?;
        }

        pivot.left = Some(node.id);
        pivot.parent = node.parent;
        node.parent = Some(pivot.id);

        node.refresh_balance();
        pivot.height_left = node.height();
        pivot.refresh_balance();
        Ok(())
    }

    /// Lift `pivot` (the left child of `node`) above `node`.
    async fn rotate_right(
        &self,
        node: &mut TreeNode<K, V>,
        pivot: &mut TreeNode<K, V>,
    ) -> Result<()> {
        let inner = pivot.right;
        node.left = inner;
        node.height_left = pivot.height_right;
        if let Some(id) = inner {
            self.reparent(id, node.id).await?;
        }

        pivot.right = Some(node.id);
        pivot.parent = node.parent;
        node.parent = Some(pivot.id);

        node.refresh_balance();
        pivot.height_right = node.height();
        pivot.refresh_balance();
        Ok(())
    }

    async fn reparent(&self, id: NodeId, parent: NodeId) -> Result<()> {
        let mut node = self.load_node(id).await?;
        node.parent = Some(parent);
        self.save_node(&node).await
    }

    /// Point `parent`'s link at `old` to `new` instead (or move the root)
    async fn replace_child(&self, parent: Option<NodeId>, old: NodeId, new: NodeId) -> Result<()> {
        let Some(parent_id) = parent else {
            return self.set_root(Some(new)).await;
        };

        let mut parent_node = self.load_node(parent_id).await?;
        if parent_node.left == Some(old) {
            parent_node.left = Some(new);
        } else if parent_node.right == Some(old) {
            parent_node.right = Some(new);
        } else {
            return Err(ArborError::Corruption(format!(
                "node {} is not a child of its recorded parent {}",
                old, parent_id
            )));
        }
        self.save_node(&parent_node).await
    }
}

/// The child a rotation needs; its absence means cached heights lie
fn required(child: Option<NodeId>, of: NodeId) -> Result<NodeId> {
    child.ok_or_else(|| {
        ArborError::Corruption(format!(
            "node {} is unbalanced towards a missing child",
            of
        ))
    })
}
