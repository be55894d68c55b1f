//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};

/// Frame header: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound on a single frame's data section (64 MB).
/// A larger length field can only come from a torn or corrupted header.
pub const MAX_ENTRY_SIZE: usize = 64 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Overwrite the bytes stored under a key
    Write { key: Vec<u8>, value: Vec<u8> },
}

/// Data section of a frame (everything but the LSN)
#[derive(Serialize, Deserialize)]
struct Body {
    operation: Operation,
    timestamp: u64,
}

impl WalEntry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Serialize into a framed byte buffer: header + data
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = self.encode_body()?;
        let crc = Self::checksum(self.lsn, &data);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&data);

        Ok(bytes)
    }

    /// Deserialize one framed entry, verifying its checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ArborError::WalCorruption(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let (lsn, crc, len) = parse_header(&bytes[..HEADER_SIZE]);

        if len > MAX_ENTRY_SIZE {
            return Err(ArborError::WalCorruption(format!(
                "Entry length {} exceeds maximum {}",
                len, MAX_ENTRY_SIZE
            )));
        }

        if bytes.len() < HEADER_SIZE + len {
            return Err(ArborError::WalCorruption(format!(
                "Incomplete data: expected {} bytes, got {}",
                len,
                bytes.len() - HEADER_SIZE
            )));
        }

        let data = &bytes[HEADER_SIZE..HEADER_SIZE + len];
        Self::from_parts(lsn, crc, data)
    }

    /// Rebuild an entry from an already-split header and data section
    pub(crate) fn from_parts(lsn: u64, crc: u32, data: &[u8]) -> Result<Self> {
        let actual = Self::checksum(lsn, data);
        if actual != crc {
            return Err(ArborError::WalCorruption(format!(
                "CRC mismatch at LSN {}: stored {:#010x}, computed {:#010x}",
                lsn, crc, actual
            )));
        }

        let body: Body = bincode::deserialize(data)
            .map_err(|e| ArborError::WalCorruption(format!("Undecodable entry body: {}", e)))?;

        Ok(Self {
            lsn,
            operation: body.operation,
            timestamp: body.timestamp,
        })
    }

    /// Size of the framed entry in bytes
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(HEADER_SIZE + self.encode_body()?.len())
    }

    /// CRC32 over LSN + data section
    pub fn compute_crc(&self) -> Result<u32> {
        let data = self.encode_body()?;
        Ok(Self::checksum(self.lsn, &data))
    }

    fn encode_body(&self) -> Result<Vec<u8>> {
        let body = Body {
            operation: self.operation.clone(),
            timestamp: self.timestamp,
        };
        bincode::serialize(&body).map_err(|e| ArborError::Serialization(e.to_string()))
    }

    fn checksum(lsn: u64, data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&lsn.to_le_bytes());
        hasher.update(data);
        hasher.finalize()
    }
}

/// Split a header into (lsn, crc, data length)
pub(crate) fn parse_header(header: &[u8]) -> (u64, u32, usize) {
    let mut lsn = [0u8; 8];
    let mut crc = [0u8; 4];
    let mut len = [0u8; 4];
    lsn.copy_from_slice(&header[0..8]);
    crc.copy_from_slice(&header[8..12]);
    len.copy_from_slice(&header[12..16]);

    (
        u64::from_le_bytes(lsn),
        u32::from_le_bytes(crc),
        u32::from_le_bytes(len) as usize,
    )
}
