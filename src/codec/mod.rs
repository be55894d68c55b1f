//! Node Codec Module
//!
//! Serialized record formats for the two engines.
//!
//! ## Responsibilities
//! - Tree node records (key, value, own id, parent/child ids, cached heights)
//! - Linked-set node records (head/element entry, next/previous keys)
//! - The reserved tombstone payload standing in for deletion
//!
//! ## Encoding
//! Records are `bincode` encodings of `serde` derives. A record whose bytes
//! equal [`TOMBSTONE`] is treated as absent on every read.

mod set_node;
mod tree_node;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ArborError, Result};

pub use set_node::{SetEntry, SetNode};
pub use tree_node::{NodeId, TreeNode};

/// Reserved payload written in place of a deleted record
pub const TOMBSTONE: &[u8] = b"\xffARBORKV:TOMBSTONE\xff";

/// Whether a stored payload is the deletion marker
pub fn is_tombstone(bytes: &[u8]) -> bool {
    bytes == TOMBSTONE
}

/// Encode a record
pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    bincode::serialize(record).map_err(|e| ArborError::Serialization(e.to_string()))
}

/// Decode a record
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| ArborError::Serialization(e.to_string()))
}
