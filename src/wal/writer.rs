//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::WalSyncStrategy;
use crate::error::{ArborError, Result};
use super::{Operation, WalEntry, WalReader};

/// Writes entries to the WAL file
pub struct WalWriter {
    writer: BufWriter<File>,

    /// LSN the next append will receive
    next_lsn: u64,

    sync_strategy: WalSyncStrategy,

    /// Appends since the last fsync
    uncommitted: usize,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// An existing file is scanned so that LSNs continue after its last
    /// valid entry. Callers that may face a torn tail run
    /// [`WalRecovery::recover`](super::WalRecovery::recover) first.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let last_lsn = if path.exists() {
            Self::scan_last_lsn(path)?
        } else {
            0
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            next_lsn: last_lsn + 1,
            sync_strategy,
            uncommitted: 0,
        })
    }

    /// Append an operation to the WAL, returning its LSN
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let lsn = self.next_lsn;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        self.writer
            .write_all(&bytes)
            .map_err(|e| ArborError::WalWrite(format!("append at LSN {}: {}", lsn, e)))?;
        self.writer
            .flush()
            .map_err(|e| ArborError::WalWrite(format!("flush at LSN {}: {}", lsn, e)))?;

        self.next_lsn += 1;
        self.uncommitted += 1;

        let should_sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted >= count,
        };
        if should_sync {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Get the LSN the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Number of appends not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    fn scan_last_lsn(path: &Path) -> Result<u64> {
        let mut last = 0;
        for entry in WalReader::open(path)?.entries() {
            match entry {
                Ok(entry) => last = entry.lsn,
                Err(_) => break,
            }
        }
        Ok(last)
    }
}
