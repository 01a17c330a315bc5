use std::{cmp::Ordering, collections::BTreeSet};

use borsh::BorshSerialize;
use dbrb_rs::types::{
    basic::ProcessId,
    view::{quorum_size, View},
};

mod common;

use crate::common::process::{id_of, signing_keys, view_of};

#[test]
fn quorum_size_test() {
    assert_eq!(quorum_size(0), 0);
    assert_eq!(quorum_size(1), 1);
    assert_eq!(quorum_size(2), 2);
    assert_eq!(quorum_size(3), 3);
    assert_eq!(quorum_size(4), 3);
    assert_eq!(quorum_size(5), 4);
    assert_eq!(quorum_size(7), 5);
    assert_eq!(quorum_size(10), 7);
    assert_eq!(quorum_size(100), 67);
}

#[test]
fn quorums_intersect_in_a_correct_member_test() {
    for n in 1..=200 {
        let faults = (n - 1) / 3;
        let quorum = quorum_size(n);
        assert!(quorum <= n);
        assert!(n >= 3 * faults + 1);
        // Two quorums overlap in at least 2q - n members, more than the number of faulty members.
        assert!(2 * quorum - n >= faults + 1, "n = {}", n);
    }
}

#[test]
fn view_membership_and_order_test() {
    let keys = signing_keys(4);
    let full = view_of(&keys);
    let partial = view_of(&keys[..3]);
    let other = view_of(&keys[1..]);

    assert_eq!(full.len(), 4);
    assert_eq!(full.quorum_size(), 3);
    assert!(keys.iter().all(|key| full.is_member(&id_of(key))));
    assert!(!partial.is_member(&id_of(&keys[3])));

    assert!(partial.is_subview_of(&full));
    assert!(!full.is_subview_of(&partial));
    assert!(full.is_subview_of(&full));
    assert!(View::new().is_subview_of(&partial));

    assert!(partial < full);
    assert!(full > partial);
    assert_eq!(full.partial_cmp(&full), Some(Ordering::Equal));
    assert_eq!(partial.partial_cmp(&other), None);
    assert_ne!(partial, other);
}

#[test]
fn view_merge_and_difference_test() {
    let keys = signing_keys(4);
    let left = view_of(&keys[..2]);
    let right = view_of(&keys[1..]);

    let merged = left.merge(&right);
    assert_eq!(merged, view_of(&keys));
    // Merging returns a new view, leaving the operands untouched.
    assert_eq!(left.len(), 2);
    assert_eq!(right.len(), 3);

    assert_eq!(merged.difference(&right), view_of(&keys[..1]));
    assert!(left.difference(&merged).is_empty());
}

#[test]
fn view_serialization_is_canonical_test() {
    let keys = signing_keys(5);
    let ids: Vec<ProcessId> = keys.iter().map(id_of).collect();

    let forwards: View = ids.iter().copied().collect();
    let backwards: View = ids.iter().rev().copied().collect();
    assert_eq!(forwards, backwards);

    let bytes = forwards.try_to_vec().unwrap();
    assert_eq!(bytes, backwards.try_to_vec().unwrap());

    // A little-endian member count followed by the ids in ascending order.
    let mut expected = (ids.len() as u32).to_le_bytes().to_vec();
    let sorted: BTreeSet<ProcessId> = ids.iter().copied().collect();
    for id in &sorted {
        expected.extend_from_slice(&id.bytes());
    }
    assert_eq!(bytes, expected);

    let members: Vec<ProcessId> = forwards.members().copied().collect();
    assert_eq!(members, sorted.into_iter().collect::<Vec<_>>());
}
