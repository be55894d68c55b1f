//! # ArborKV
//!
//! Storage-backed data structures over an opaque async key/value byte store:
//! - A persistent AVL index with ranked (top-N) queries
//! - Persistent ordered sets kept as doubly-linked chains
//! - A durable, crash-recoverable log store to run them on
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │              (config, shared store, scope locks)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   AvlTree   │          │  LinkedSet  │
//!   │ (rotations) │          │  (splices)  │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │ Codec/Records│
//!               └──────┬───────┘
//!                      ▼
//!               ┌──────────────┐        ┌─────────────┐
//!               │  ByteStore   │ ─────▶ │     WAL     │
//!               │(Memory / Log)│        │  (Append)   │
//!               └──────────────┘        └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod store;
pub mod codec;
pub mod avl;
pub mod set;
pub mod lock;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ArborError, Result};
pub use config::Config;
pub use engine::Engine;
pub use avl::AvlTree;
pub use set::LinkedSet;
pub use store::{ByteStore, LogStore, MemoryStore};
pub use lock::{ScopeGuard, ScopeLocks};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ArborKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
