//! In-memory byte store

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::Result;
use super::ByteStore;

/// Volatile [`ByteStore`] backed by a hash map
///
/// Reads hand out cheap `Bytes` clones; all methods take `&self`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<Vec<u8>, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys ever written (tombstones included)
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

#[async_trait]
impl ByteStore for MemoryStore {
    async fn read(&self, key: &[u8]) -> Result<Option<Bytes>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn write(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data
            .write()
            .insert(key.to_vec(), Bytes::copy_from_slice(value));
        Ok(())
    }
}
