//! Byte Store Module
//!
//! The flat key/value byte store both engines are built on.
//!
//! ## Responsibilities
//! - Asynchronous `read`/`write` of raw byte buffers, last write wins per key
//! - No delete primitive: deletion is a write of the tombstone payload
//! - Typed record access ([`Records`]) shared by the AVL and set engines
//!
//! ## Implementations
//! - [`MemoryStore`]: in-process map, for tests and embedding
//! - [`LogStore`]: durable; every write is appended to the WAL first
//!
//! Callers bring their own backend by implementing [`ByteStore`].

mod log;
mod memory;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{self, TOMBSTONE};
use crate::error::Result;

pub use self::log::LogStore;
pub use memory::MemoryStore;

/// Asynchronous byte-addressed key/value store
///
/// Implementations guarantee durable last-write-wins semantics per key.
/// Failures are returned as-is; the engines never retry.
#[async_trait]
pub trait ByteStore: Debug + Send + Sync {
    /// Read the bytes stored under `key`, `None` if never written
    async fn read(&self, key: &[u8]) -> Result<Option<Bytes>>;

    /// Overwrite the bytes stored under `key`
    async fn write(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Make all acknowledged writes durable
    ///
    /// The default implementation does nothing.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Typed record access over a [`ByteStore`]
///
/// Tombstoned records read back as absent.
#[derive(Debug)]
pub struct Records<S> {
    store: Arc<S>,
}

impl<S> Clone for Records<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ByteStore> Records<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Load and decode the record at `key`
    pub async fn load<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.store.read(key).await? {
            Some(bytes) if !codec::is_tombstone(&bytes) => Ok(Some(codec::decode(&bytes)?)),
            _ => Ok(None),
        }
    }

    /// Encode and store `record` at `key`
    pub async fn save<T: Serialize>(&self, key: &[u8], record: &T) -> Result<()> {
        let bytes = codec::encode(record)?;
        self.store.write(key, &bytes).await
    }

    /// Logically delete the record at `key`
    pub async fn erase(&self, key: &[u8]) -> Result<()> {
        self.store.write(key, TOMBSTONE).await
    }

    /// Whether a live (non-tombstoned) record exists at `key`
    pub async fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(matches!(
            self.store.read(key).await?,
            Some(bytes) if !codec::is_tombstone(&bytes)
        ))
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

/// Concatenate an instance prefix and a field/element suffix
pub fn composite_key(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix);
    key
}
