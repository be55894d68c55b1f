//! Tests for the linked set engine
//!
//! These tests verify:
//! - Set lifecycle (create, exists, delete)
//! - Newest-first ordering of added elements
//! - Removal from the front, middle and back of the chain
//! - Re-adding an existing key

use std::sync::Arc;

use arborkv::codec::SetNode;
use arborkv::store::{composite_key, Records};
use arborkv::{ArborError, LinkedSet, MemoryStore};
use futures::{StreamExt, TryStreamExt};
use tracing_subscriber::EnvFilter;

// =============================================================================
// Helper Functions
// =============================================================================

type Sets = LinkedSet<MemoryStore, u32>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("arborkv=trace"))
        .with_test_writer()
        .try_init();
}

fn new_sets() -> Sets {
    LinkedSet::new(Arc::new(MemoryStore::new()))
}

async fn values(sets: &Sets, set_id: &[u8]) -> Vec<u32> {
    sets.as_sequence(set_id).try_collect().await.unwrap()
}

async fn set_with(sets: &Sets, set_id: &[u8], elements: &[(&str, u32)]) {
    assert!(sets.create_set(set_id).await.unwrap());
    for (key, value) in elements {
        assert!(sets.add(set_id, key.as_bytes(), *value).await.unwrap());
    }
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_set_scenario() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1), ("b", 2)]).await;

    assert_eq!(values(&sets, b"s").await, vec![2, 1]);

    assert!(sets.remove(b"s", b"a").await.unwrap());
    assert_eq!(sets.get(b"s", b"a").await.unwrap(), None);
    assert_eq!(values(&sets, b"s").await, vec![2]);
}

#[tokio::test]
async fn test_create_set_twice() {
    let sets = new_sets();

    assert!(sets.create_set(b"s").await.unwrap());
    assert!(!sets.create_set(b"s").await.unwrap());
    assert!(sets.is_set_exists(b"s").await.unwrap());
}

#[tokio::test]
async fn test_missing_set() {
    let sets = new_sets();

    assert!(!sets.is_set_exists(b"nope").await.unwrap());
    assert!(!sets.add(b"nope", b"a", 1).await.unwrap());
    assert_eq!(sets.get(b"nope", b"a").await.unwrap(), None);
    assert!(values(&sets, b"nope").await.is_empty());
    assert!(!sets.delete_set(b"nope").await.unwrap());
}

#[tokio::test]
async fn test_empty_set_yields_nothing() {
    let sets = new_sets();
    sets.create_set(b"s").await.unwrap();

    assert!(values(&sets, b"s").await.is_empty());
}

#[tokio::test]
async fn test_delete_set() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1), ("b", 2)]).await;

    assert!(sets.delete_set(b"s").await.unwrap());

    assert!(!sets.is_set_exists(b"s").await.unwrap());
    assert!(values(&sets, b"s").await.is_empty());
    assert_eq!(sets.get(b"s", b"a").await.unwrap(), None);
}

#[tokio::test]
async fn test_recreated_set_starts_empty() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1), ("b", 2)]).await;
    sets.delete_set(b"s").await.unwrap();

    assert!(sets.create_set(b"s").await.unwrap());
    assert!(values(&sets, b"s").await.is_empty());

    // Orphaned element records from the old set do not leak back in
    assert!(sets.add(b"s", b"a", 10).await.unwrap());
    assert_eq!(values(&sets, b"s").await, vec![10]);
}

#[tokio::test]
async fn test_sets_are_independent() {
    let sets = new_sets();
    set_with(&sets, b"left", &[("x", 1)]).await;
    set_with(&sets, b"right", &[("x", 2), ("y", 3)]).await;

    sets.remove(b"right", b"x").await.unwrap();

    assert_eq!(values(&sets, b"left").await, vec![1]);
    assert_eq!(values(&sets, b"right").await, vec![3]);
}

// =============================================================================
// Element Tests
// =============================================================================

#[tokio::test]
async fn test_get_present_elements() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1), ("b", 2), ("c", 3)]).await;

    assert_eq!(sets.get(b"s", b"a").await.unwrap(), Some(1));
    assert_eq!(sets.get(b"s", b"c").await.unwrap(), Some(3));
    assert_eq!(sets.get(b"s", b"z").await.unwrap(), None);
}

#[tokio::test]
async fn test_remove_missing_element() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1)]).await;

    assert!(!sets.remove(b"s", b"z").await.unwrap());
    assert_eq!(values(&sets, b"s").await, vec![1]);
}

#[tokio::test]
async fn test_remove_first_middle_last() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]).await;

    // Chain is e, d, c, b, a
    assert!(sets.remove(b"s", b"e").await.unwrap());
    assert_eq!(values(&sets, b"s").await, vec![4, 3, 2, 1]);

    assert!(sets.remove(b"s", b"c").await.unwrap());
    assert_eq!(values(&sets, b"s").await, vec![4, 2, 1]);

    assert!(sets.remove(b"s", b"a").await.unwrap());
    assert_eq!(values(&sets, b"s").await, vec![4, 2]);

    assert!(sets.remove(b"s", b"d").await.unwrap());
    assert!(sets.remove(b"s", b"b").await.unwrap());
    assert!(values(&sets, b"s").await.is_empty());
}

#[tokio::test]
async fn test_add_after_remove() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1), ("b", 2)]).await;

    sets.remove(b"s", b"a").await.unwrap();
    sets.add(b"s", b"a", 7).await.unwrap();

    assert_eq!(values(&sets, b"s").await, vec![7, 2]);
}

#[tokio::test]
async fn test_re_add_moves_element_to_front() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1), ("b", 2), ("c", 3)]).await;

    assert!(sets.add(b"s", b"a", 10).await.unwrap());

    assert_eq!(values(&sets, b"s").await, vec![10, 3, 2]);
    assert_eq!(sets.get(b"s", b"a").await.unwrap(), Some(10));
}

#[tokio::test]
async fn test_re_add_front_element() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1), ("b", 2)]).await;

    assert!(sets.add(b"s", b"b", 20).await.unwrap());

    assert_eq!(values(&sets, b"s").await, vec![20, 1]);
}

#[tokio::test]
async fn test_long_chain_order() {
    let sets = new_sets();
    sets.create_set(b"s").await.unwrap();

    for i in 0..50u32 {
        sets.add(b"s", format!("k{}", i).as_bytes(), i).await.unwrap();
    }

    let expected: Vec<u32> = (0..50).rev().collect();
    assert_eq!(values(&sets, b"s").await, expected);
}

#[tokio::test]
async fn test_empty_element_key_is_rejected() {
    let sets = new_sets();
    set_with(&sets, b"s", &[("a", 1)]).await;

    // The empty key would address the head record
    assert!(!sets.add(b"s", b"", 9).await.unwrap());
    assert!(!sets.remove(b"s", b"").await.unwrap());

    assert!(sets.is_set_exists(b"s").await.unwrap());
    assert_eq!(values(&sets, b"s").await, vec![1]);
}

// =============================================================================
// Logging / Corruption Tests
// =============================================================================

#[tokio::test]
async fn test_operations_with_trace_logging() {
    init_tracing();
    let sets = new_sets();

    set_with(&sets, b"logged", &[("a", 1), ("b", 2)]).await;
    assert!(sets.remove(b"logged", b"a").await.unwrap());
    assert!(sets.delete_set(b"logged").await.unwrap());

    assert!(!sets.is_set_exists(b"logged").await.unwrap());
}

#[tokio::test]
async fn test_link_to_head_record_is_corruption() {
    let store = Arc::new(MemoryStore::new());
    let sets: Sets = LinkedSet::new(Arc::clone(&store));
    let records = Records::new(store);
    set_with(&sets, b"s", &[("a", 1)]).await;

    // Overwrite the element with a head record
    records
        .save(&composite_key(b"s", b"a"), &SetNode::<u32>::head())
        .await
        .unwrap();

    let items: Vec<_> = sets.as_sequence(b"s").collect().await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(ArborError::Corruption(_))));
}
