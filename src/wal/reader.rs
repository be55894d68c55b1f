//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{ArborError, Result};
use super::entry::{parse_header, HEADER_SIZE, MAX_ENTRY_SIZE};
use super::WalEntry;

/// Reads entries from the WAL file
///
/// A torn frame at the end of the file (crash mid-append) ends iteration
/// with `Ok(None)`; a complete frame with a bad checksum is an error.
pub struct WalReader {
    reader: BufReader<File>,

    /// Byte offset just past the last entry returned
    position: u64,

    /// Set once a partial frame has been seen at the tail
    partial_tail: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            partial_tail: false,
        })
    }

    /// Read the next entry from the WAL
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        let read = self.read_full(&mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            self.partial_tail = true;
            return Ok(None);
        }

        let (lsn, crc, len) = parse_header(&header);
        if len > MAX_ENTRY_SIZE {
            return Err(ArborError::WalCorruption(format!(
                "Entry length {} at offset {} exceeds maximum",
                len, self.position
            )));
        }

        let mut data = vec![0u8; len];
        if self.read_full(&mut data)? < len {
            self.partial_tail = true;
            return Ok(None);
        }

        let entry = WalEntry::from_parts(lsn, crc, &data)?;
        self.position += (HEADER_SIZE + len) as u64;

        Ok(Some(entry))
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Offset just past the last valid entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether a torn frame was found at the tail
    pub fn has_partial_tail(&self) -> bool {
        self.partial_tail
    }

    /// Fill `buf` as far as the file allows; returns bytes read
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

/// Iterator over WAL entries
///
/// Yields a corruption error at most once, then stops.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
