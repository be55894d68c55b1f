//! Structural self-check

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::NodeId;
use crate::error::Result;
use crate::store::ByteStore;

use super::AvlTree;

impl<S, K, V> AvlTree<S, K, V>
where
    S: ByteStore,
    K: Ord + Serialize + DeserializeOwned + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    /// Verify every node's cached heights, balance factor and parent link
    ///
    /// Returns `Ok(false)` at the first violation (logged at warn level).
    /// Storage failures still propagate as errors.
    pub async fn self_check(&self) -> Result<bool> {
        match self.root_id().await? {
            Some(root) => Ok(self.check_subtree(root, None).await?.is_some()),
            None => Ok(true),
        }
    }

    /// True height of the subtree at `id`, or `None` on a violation
    fn check_subtree(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
    ) -> BoxFuture<'_, Result<Option<i32>>> {
        async move {
            let node = self.load_node(id).await?;

            if node.parent != parent {
                tracing::warn!(
                    "Tree {}: node {} records parent {:?}, expected {:?}",
                    self.name(),
                    id,
                    node.parent,
                    parent
                );
                return Ok(None);
            }

            let left = match node.left {
                Some(child) => match self.check_subtree(child, Some(id)).await? {
                    Some(height) => height,
                    None => return Ok(None),
                },
                None => -1,
            };
            let right = match node.right {
                Some(child) => match self.check_subtree(child, Some(id)).await? {
                    Some(height) => height,
                    None => return Ok(None),
                },
                None => -1,
            };

            if node.height_left != left || node.height_right != right {
                tracing::warn!(
                    "Tree {}: node {} caches heights ({}, {}), actual ({}, {})",
                    self.name(),
                    id,
                    node.height_left,
                    node.height_right,
                    left,
                    right
                );
                return Ok(None);
            }

            if node.balance != left - right {
                tracing::warn!(
                    "Tree {}: node {} caches balance {}, actual {}",
                    self.name(),
                    id,
                    node.balance,
                    left - right
                );
                return Ok(None);
            }

            if !(-1..=1).contains(&node.balance) {
                tracing::warn!(
                    "Tree {}: node {} is out of balance ({})",
                    self.name(),
                    id,
                    node.balance
                );
                return Ok(None);
            }

            Ok(Some(left.max(right) + 1))
        }
        .boxed()
    }
}
