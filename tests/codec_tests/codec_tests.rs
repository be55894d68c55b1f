//! Tests for record encoding
//!
//! These tests verify:
//! - Tree and set records survive encode/decode
//! - The tombstone payload is recognised and never a valid record
//! - Undecodable bytes surface as serialization errors

use arborkv::codec::{self, is_tombstone, NodeId, SetEntry, SetNode, TreeNode, TOMBSTONE};
use arborkv::ArborError;

// =============================================================================
// Tree Node Tests
// =============================================================================

#[test]
fn test_tree_node_round_trip() {
    let mut node = TreeNode::leaf(NodeId(4), "key".to_string(), vec![1u8, 2, 3], Some(NodeId(2)));
    node.left = Some(NodeId(9));
    node.height_left = 0;
    node.refresh_balance();

    let bytes = codec::encode(&node).unwrap();
    let decoded: TreeNode<String, Vec<u8>> = codec::decode(&bytes).unwrap();

    assert_eq!(decoded, node);
    assert_eq!(decoded.balance, 1);
    assert_eq!(decoded.sole_child(), Some(NodeId(9)));
}

#[test]
fn test_root_node_has_no_parent() {
    let node = TreeNode::leaf(NodeId(1), 10u64, (), None);

    let decoded: TreeNode<u64, ()> = codec::decode(&codec::encode(&node).unwrap()).unwrap();

    assert_eq!(decoded.parent, None);
    assert_eq!(decoded.sole_child(), None);
}

#[test]
fn test_node_id_display() {
    assert_eq!(NodeId(42).to_string(), "42");
}

// =============================================================================
// Set Node Tests
// =============================================================================

#[test]
fn test_set_head_round_trip() {
    let mut head: SetNode<u32> = SetNode::head();
    head.next = Some(b"setkey".to_vec());

    let decoded: SetNode<u32> = codec::decode(&codec::encode(&head).unwrap()).unwrap();

    assert!(decoded.is_head());
    assert_eq!(decoded.clone().into_value(), None);
    assert_eq!(decoded.next, Some(b"setkey".to_vec()));
    assert_eq!(decoded.previous, None);
}

#[test]
fn test_set_element_round_trip() {
    let node = SetNode::element("payload".to_string(), None, Some(b"set".to_vec()));

    let decoded: SetNode<String> = codec::decode(&codec::encode(&node).unwrap()).unwrap();

    assert!(!decoded.is_head());
    assert_eq!(decoded.entry, SetEntry::Element("payload".to_string()));
    assert_eq!(decoded.into_value(), Some("payload".to_string()));
}

// =============================================================================
// Tombstone Tests
// =============================================================================

#[test]
fn test_tombstone_detection() {
    assert!(is_tombstone(TOMBSTONE));
    assert!(!is_tombstone(b""));
    assert!(!is_tombstone(&TOMBSTONE[..TOMBSTONE.len() - 1]));
}

#[test]
fn test_encoded_records_are_not_tombstones() {
    let node = TreeNode::leaf(NodeId(1), 1u32, 1u32, None);
    let head: SetNode<u32> = SetNode::head();

    assert!(!is_tombstone(&codec::encode(&node).unwrap()));
    assert!(!is_tombstone(&codec::encode(&head).unwrap()));
    assert!(!is_tombstone(&codec::encode(&NodeId(1)).unwrap()));
}

#[test]
fn test_garbage_fails_to_decode() {
    let result = codec::decode::<TreeNode<String, String>>(&[0xFF, 0x01]);

    assert!(matches!(result, Err(ArborError::Serialization(_))));
}
