//! Ordered traversal
//!
//! Both walks visit right subtree, node, left subtree, yielding keys in
//! descending order. Nothing is materialized beyond the current path.

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{NodeId, TreeNode};
use crate::error::Result;
use crate::store::ByteStore;

use super::AvlTree;

/// Position of a descending walk
enum Cursor<K, V> {
    Start,
    /// Nodes whose right subtree is done but which are not yet emitted
    Walking(Vec<TreeNode<K, V>>),
    Done,
}

impl<S, K, V> AvlTree<S, K, V>
where
    S: ByteStore,
    K: Ord + Serialize + DeserializeOwned + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    /// Lazily stream every `(key, value)` in descending key order
    ///
    /// Each call starts a fresh walk from the root. A storage error is
    /// yielded once and ends the stream.
    pub fn as_sequence(&self) -> impl Stream<Item = Result<(K, V)>> + '_ {
        stream::unfold(Cursor::Start, move |cursor| async move {
            let mut stack = match cursor {
                Cursor::Done => return None,
                Cursor::Walking(stack) => stack,
                Cursor::Start => {
                    let mut stack = Vec::new();
                    let seeded = match self.root_id().await {
                        Ok(root) => self.push_right_spine(root, &mut stack).await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = seeded {
                        return Some((Err(e), Cursor::Done));
                    }
                    stack
                }
            };

            let node = stack.pop()?;
            if let Err(e) = self.push_right_spine(node.left, &mut stack).await {
                return Some((Err(e), Cursor::Done));
            }
            Some((Ok((node.key, node.value)), Cursor::Walking(stack)))
        })
    }

    /// The `n` largest entries, descending; same as the first `n` items of
    /// [`as_sequence`](Self::as_sequence)
    ///
    /// Subtrees are skipped once the budget is spent, so only the path to
    /// the `n`-th entry is read.
    pub async fn top_n(&self, n: usize) -> Result<Vec<(K, V)>> {
        let mut entries = Vec::new();
        if n == 0 {
            return Ok(entries);
        }

        let mut budget = n;
        let root = self.root_id().await?;
        self.collect_top(root, &mut budget, &mut entries).await?;
        Ok(entries)
    }

    fn collect_top<'a>(
        &'a self,
        id: Option<NodeId>,
        budget: &'a mut usize,
        entries: &'a mut Vec<(K, V)>,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let Some(id) = id else {
                return Ok(());
            };
            if *budget == 0 {
                return Ok(());
            }

            let node = self.load_node(id).await?;
            self.collect_top(node.right, budget, entries).await?;
            if *budget == 0 {
                return Ok(());
            }

            *budget -= 1;
            let left = node.left;
            entries.push((node.key, node.value));
            self.collect_top(left, budget, entries).await
        }
        .boxed()
    }

    /// Push `next` and its chain of right descendants
    async fn push_right_spine(
        &self,
        mut next: Option<NodeId>,
        stack: &mut Vec<TreeNode<K, V>>,
    ) -> Result<()> {
        while let Some(id) = next {
            let node = self.load_node(id).await?;
            next = node.right;
            stack.push(node);
        }
        Ok(())
    }
}
