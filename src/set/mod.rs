//! Linked Set Module
//!
//! Named, persistent sets kept as doubly-linked chains in a byte store.
//!
//! ## Responsibilities
//! - Create/delete a named set (its head sentinel)
//! - Add, remove and look up elements by key
//! - Stream values in link order (most recently added first)
//!
//! ## Key Space
//! ```text
//! {set_id}         → head sentinel (SetEntry::Head)
//! {set_id}{key}    → element node
//! ```
//! Callers choose set ids so that `set_id ∥ key` never collides with
//! another set's records; this is not checked.
//!
//! ## Limitations
//! - Deleting a set drops only its head; element records stay behind,
//!   unreachable
//! - One writer per set id, as for trees

mod list;

pub use list::LinkedSet;
