//! Configuration for ArborKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{ArborError, Result};

/// Main configuration for an ArborKV engine
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the durable log store
    /// Internal structure:
    ///   {data_dir}/
    ///     └── arbor.log        (append-only record log)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the record log
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Run the AVL self-check after every insert/delete and log violations.
    /// Diagnostic only: doubles the read traffic of each mutation.
    pub verify_writes: bool,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./arborkv_data"),
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            verify_writes: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ArborError::Config("data_dir must not be empty".to_string()));
        }

        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(ArborError::Config(
                "EveryNEntries sync count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Enable or disable post-mutation self-checks on trees
    pub fn verify_writes(mut self, enabled: bool) -> Self {
        self.config.verify_writes = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
