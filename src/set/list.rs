//! Linked set implementation

use std::marker::PhantomData;
use std::sync::Arc;

use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::SetNode;
use crate::error::{ArborError, Result};
use crate::store::{composite_key, ByteStore, Records};

/// Persistent ordered sets over a byte store
///
/// One `LinkedSet` serves every set id in the store; the id is passed to
/// each operation.
pub struct LinkedSet<S, V> {
    records: Records<S>,
    _marker: PhantomData<fn() -> V>,
}

impl<S, V> Clone for LinkedSet<S, V> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            _marker: PhantomData,
        }
    }
}

/// Position of a chain walk
enum Cursor {
    Start,
    At(Vec<u8>),
    Done,
}

impl<S, V> LinkedSet<S, V>
where
    S: ByteStore,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            records: Records::new(store),
            _marker: PhantomData,
        }
    }

    /// Create an empty set; `false` if a record already exists at `set_id`
    pub async fn create_set(&self, set_id: &[u8]) -> Result<bool> {
        if self.records.exists(set_id).await? {
            return Ok(false);
        }

        self.records.save(set_id, &SetNode::<V>::head()).await?;
        tracing::debug!("Created set {}", key_text(set_id));
        Ok(true)
    }

    /// Drop the set's head; `false` if the set does not exist
    ///
    /// Element records are not visited and stay orphaned.
    pub async fn delete_set(&self, set_id: &[u8]) -> Result<bool> {
        if !self.records.exists(set_id).await? {
            return Ok(false);
        }

        self.records.erase(set_id).await?;
        tracing::debug!("Deleted set {}", key_text(set_id));
        Ok(true)
    }

    /// Whether the set's head exists
    pub async fn is_set_exists(&self, set_id: &[u8]) -> Result<bool> {
        self.records.exists(set_id).await
    }

    /// Insert an element directly after the head
    ///
    /// Returns `false` if the set does not exist or `key` is empty. Adding a
    /// key that is already present moves that element to the front with the
    /// new value.
    pub async fn add(&self, set_id: &[u8], key: &[u8], value: V) -> Result<bool> {
        // An empty key addresses the head record itself
        if key.is_empty() || !self.records.exists(set_id).await? {
            return Ok(false);
        }

        let node_key = composite_key(set_id, key);
        if self.records.exists(&node_key).await? {
            // Relinking in place would make the element its own successor
            self.splice_out(&node_key).await?;
        }

        // Re-read: the splice may have rewritten the head
        let mut head = self.load_head(set_id).await?;
        let first = head.next.take();

        if let Some(first_key) = &first {
            let mut first_node = self.load_link(first_key).await?;
            first_node.previous = Some(node_key.clone());
            self.records.save(first_key, &first_node).await?;
        }

        let node = SetNode::element(value, first, Some(set_id.to_vec()));
        self.records.save(&node_key, &node).await?;

        head.next = Some(node_key);
        self.records.save(set_id, &head).await?;

        tracing::trace!("Added element to set {}", key_text(set_id));
        Ok(true)
    }

    /// Unlink the element `key`; `false` if it has no record
    pub async fn remove(&self, set_id: &[u8], key: &[u8]) -> Result<bool> {
        let node_key = composite_key(set_id, key);
        if key.is_empty() || !self.records.exists(&node_key).await? {
            return Ok(false);
        }

        self.splice_out(&node_key).await?;
        self.records.erase(&node_key).await?;

        tracing::trace!("Removed element from set {}", key_text(set_id));
        Ok(true)
    }

    /// Find the element `key` by walking the chain from the head
    pub async fn get(&self, set_id: &[u8], key: &[u8]) -> Result<Option<V>> {
        let Some(head) = self.records.load::<SetNode<V>>(set_id).await? else {
            return Ok(None);
        };

        let wanted = composite_key(set_id, key);
        let mut next = head.next;
        while let Some(node_key) = next {
            let node = self.load_link(&node_key).await?;
            if node_key == wanted {
                return Ok(node.into_value());
            }
            next = node.next;
        }
        Ok(None)
    }

    /// Lazily stream the set's values in link order (newest first)
    ///
    /// A missing set yields an empty stream. A storage error is yielded
    /// once and ends the stream.
    pub fn as_sequence<'a>(&'a self, set_id: &'a [u8]) -> impl Stream<Item = Result<V>> + 'a {
        stream::unfold(Cursor::Start, move |cursor| async move {
            let node_key = match cursor {
                Cursor::Done => return None,
                Cursor::At(node_key) => node_key,
                Cursor::Start => match self.records.load::<SetNode<V>>(set_id).await {
                    Ok(Some(head)) => head.next?,
                    Ok(None) => return None,
                    Err(e) => return Some((Err(e), Cursor::Done)),
                },
            };

            let node = match self.load_link(&node_key).await {
                Ok(node) => node,
                Err(e) => return Some((Err(e), Cursor::Done)),
            };

            if node.is_head() {
                let corrupt = ArborError::Corruption(format!(
                    "set {} links to a head record",
                    key_text(set_id)
                ));
                return Some((Err(corrupt), Cursor::Done));
            }

            let cursor = match node.next.clone() {
                Some(next) => Cursor::At(next),
                None => Cursor::Done,
            };
            node.into_value().map(|value| (Ok(value), cursor))
        })
    }

    /// Point the neighbours of `node_key` at each other
    ///
    /// A neighbour is rewritten only if it exists and still links back to
    /// `node_key`; elements orphaned by `delete_set` have neither.
    async fn splice_out(&self, node_key: &[u8]) -> Result<()> {
        let node = self.load_link(node_key).await?;

        if let Some(previous_key) = &node.previous {
            if let Some(mut previous) = self.records.load::<SetNode<V>>(previous_key).await? {
                if previous.next.as_deref() == Some(node_key) {
                    previous.next = node.next.clone();
                    self.records.save(previous_key, &previous).await?;
                }
            }
        }

        if let Some(next_key) = &node.next {
            if let Some(mut next) = self.records.load::<SetNode<V>>(next_key).await? {
                if next.previous.as_deref() == Some(node_key) {
                    next.previous = node.previous.clone();
                    self.records.save(next_key, &next).await?;
                }
            }
        }

        Ok(())
    }

    async fn load_head(&self, set_id: &[u8]) -> Result<SetNode<V>> {
        self.records
            .load(set_id)
            .await?
            .ok_or_else(|| ArborError::Corruption(format!("set {} has no head", key_text(set_id))))
    }

    /// Load a record some link points at
    async fn load_link(&self, key: &[u8]) -> Result<SetNode<V>> {
        self.records.load(key).await?.ok_or_else(|| {
            ArborError::Corruption(format!("set link points at missing record {}", key_text(key)))
        })
    }
}

fn key_text(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
