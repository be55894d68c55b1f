//! Engine Module
//!
//! Entry point tying a byte store to the index and set engines.
//!
//! ## Responsibilities
//! - Open the durable log store from a [`Config`] (with crash recovery)
//! - Hand out trees and set handles bound to the shared store
//! - Expose per-id exclusive scopes for single-writer discipline
//! - Flush the store on close

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::avl::AvlTree;
use crate::config::Config;
use crate::error::Result;
use crate::lock::{ScopeGuard, ScopeLocks};
use crate::set::LinkedSet;
use crate::store::{ByteStore, LogStore};

/// A byte store plus the engines built on it
///
/// Trees and sets obtained here share the store; they hold no state of
/// their own beyond their key prefix, so handles are cheap to create.
pub struct Engine<S = LogStore> {
    config: Config,
    store: Arc<S>,
    locks: ScopeLocks,
}

impl Engine<LogStore> {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const LOG_FILENAME: &'static str = "arbor.log";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config and create the data directory
    /// 2. Recover the record log if it exists
    /// 3. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let log_path = config.data_dir.join(Self::LOG_FILENAME);
        let store = LogStore::open(&log_path, config.wal_sync_strategy)?;

        tracing::info!(
            "Engine opened at {} ({} keys)",
            config.data_dir.display(),
            store.key_count()
        );
        Ok(Self::with_store(config, store))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Path of the record log
    pub fn log_path(&self) -> &Path {
        self.store.path()
    }
}

impl<S: ByteStore> Engine<S> {
    /// Wrap any byte store
    pub fn with_store(config: Config, store: S) -> Self {
        Self::with_shared_store(config, Arc::new(store))
    }

    /// Wrap a byte store that is also used elsewhere
    pub fn with_shared_store(config: Config, store: Arc<S>) -> Self {
        Self {
            config,
            store,
            locks: ScopeLocks::new(),
        }
    }

    /// The tree stored under prefix `name`
    pub fn tree<K, V>(&self, name: impl Into<Vec<u8>>) -> AvlTree<S, K, V>
    where
        K: Ord + Serialize + DeserializeOwned + Send + Sync,
        V: Serialize + DeserializeOwned + Send + Sync,
    {
        AvlTree::new(Arc::clone(&self.store), name).with_verification(self.config.verify_writes)
    }

    /// Set operations over this engine's store
    pub fn sets<V>(&self) -> LinkedSet<S, V>
    where
        V: Serialize + DeserializeOwned + Send + Sync,
    {
        LinkedSet::new(Arc::clone(&self.store))
    }

    /// Take the exclusive scope for a tree prefix or set id
    pub async fn lock(&self, scope: &[u8]) -> ScopeGuard {
        self.locks.acquire(scope).await
    }

    pub fn locks(&self) -> &ScopeLocks {
        &self.locks
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Make all acknowledged writes durable
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }

    /// Close the engine gracefully
    pub async fn close(self) -> Result<()> {
        self.flush().await?;
        tracing::debug!("Engine closed");
        Ok(())
    }
}
