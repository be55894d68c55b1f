//! Tests for WAL Reader
//!
//! These tests verify:
//! - Sequential reads and the iterator
//! - Torn tails end iteration without an error
//! - Checksum failures surface as errors

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use arborkv::wal::{Operation, WalEntry, WalReader, HEADER_SIZE};
use arborkv::ArborError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn entry(lsn: u64, key: &str) -> WalEntry {
    WalEntry::new(
        lsn,
        Operation::Write {
            key: key.as_bytes().to_vec(),
            value: format!("value-{}", lsn).into_bytes(),
        },
    )
}

fn write_frames(path: &PathBuf, frames: &[Vec<u8>]) {
    let mut file = File::create(path).unwrap();
    for frame in frames {
        file.write_all(frame).unwrap();
    }
    file.sync_all().unwrap();
}

// =============================================================================
// Reading Tests
// =============================================================================

#[test]
fn test_read_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();

    assert!(reader.next_entry().unwrap().is_none());
    assert!(!reader.has_partial_tail());
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_iterator_preserves_order() {
    let (_temp, wal_path) = setup_temp_wal();
    let originals: Vec<WalEntry> = (1..=5).map(|lsn| entry(lsn, "k")).collect();
    let frames: Vec<Vec<u8>> = originals.iter().map(|e| e.serialize().unwrap()).collect();
    write_frames(&wal_path, &frames);

    let read: Vec<WalEntry> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .map(|e| e.unwrap())
        .collect();

    assert_eq!(read, originals);
}

#[test]
fn test_position_tracks_valid_bytes() {
    let (_temp, wal_path) = setup_temp_wal();
    let first = entry(1, "a").serialize().unwrap();
    let second = entry(2, "b").serialize().unwrap();
    write_frames(&wal_path, &[first.clone(), second.clone()]);

    let mut reader = WalReader::open(&wal_path).unwrap();
    reader.next_entry().unwrap().unwrap();
    assert_eq!(reader.position(), first.len() as u64);

    reader.next_entry().unwrap().unwrap();
    assert_eq!(reader.position(), (first.len() + second.len()) as u64);
}

// =============================================================================
// Partial Write Tests
// =============================================================================

#[test]
fn test_partial_header_ends_iteration() {
    let (_temp, wal_path) = setup_temp_wal();
    write_frames(&wal_path, &[entry(1, "a").serialize().unwrap(), vec![0u8; 8]]);

    let mut reader = WalReader::open(&wal_path).unwrap();

    assert!(reader.next_entry().unwrap().is_some());
    assert!(reader.next_entry().unwrap().is_none());
    assert!(reader.has_partial_tail());
}

#[test]
fn test_partial_data_ends_iteration() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut torn = entry(2, "b").serialize().unwrap();
    torn.truncate(HEADER_SIZE + 3);
    write_frames(&wal_path, &[entry(1, "a").serialize().unwrap(), torn]);

    let mut reader = WalReader::open(&wal_path).unwrap();

    assert!(reader.next_entry().unwrap().is_some());
    assert!(reader.next_entry().unwrap().is_none());
    assert!(reader.has_partial_tail());
}

#[test]
fn test_checksum_failure_is_an_error() {
    let (_temp, wal_path) = setup_temp_wal();
    write_frames(&wal_path, &[entry(1, "a").serialize().unwrap()]);

    // Flip the last data byte on disk
    let len = std::fs::metadata(&wal_path).unwrap().len();
    let mut bytes = std::fs::read(&wal_path).unwrap();
    bytes[len as usize - 1] ^= 0xFF;
    let mut file = OpenOptions::new().write(true).open(&wal_path).unwrap();
    file.write_all(&bytes).unwrap();

    let mut entries = WalReader::open(&wal_path).unwrap().entries();

    assert!(matches!(entries.next(), Some(Err(ArborError::WalCorruption(_)))));
    assert!(entries.next().is_none());
}
