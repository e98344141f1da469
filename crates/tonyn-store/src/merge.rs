//! Merge-by-id reconciliation of seed data with persisted data.

use std::collections::BTreeMap;

use tonyn_types::{Circle, CircleId, Moment, MomentId, Post, PostId};

/// A record with a stable identity used for reconciliation.
pub trait Identified {
    /// The identity type.
    type Id: Ord + Copy;

    /// This record's identity.
    fn id(&self) -> Self::Id;
}

impl Identified for Post {
    type Id = PostId;

    fn id(&self) -> PostId {
        self.id
    }
}

impl Identified for Circle {
    type Id = CircleId;

    fn id(&self) -> CircleId {
        self.id
    }
}

impl Identified for Moment {
    type Id = MomentId;

    fn id(&self) -> MomentId {
        self.id
    }
}

/// Merge `persisted` over `seed` by id.
///
/// Persisted values replace seed values in place; ids only present in
/// `persisted` are appended in the order they appear there. Duplicate ids
/// inside `persisted` resolve to the last occurrence.
pub fn merge_by_id<T: Identified>(seed: Vec<T>, persisted: Vec<T>) -> Vec<T> {
    let mut slots: Vec<T> = Vec::with_capacity(seed.len().saturating_add(persisted.len()));
    let mut index: BTreeMap<T::Id, usize> = BTreeMap::new();

    for item in seed.into_iter().chain(persisted) {
        let id = item.id();
        if let Some(slot) = index.get(&id).and_then(|&pos| slots.get_mut(pos)) {
            *slot = item;
        } else {
            index.insert(id, slots.len());
            slots.push(item);
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Rec {
        id: u32,
        v: &'static str,
    }

    impl Identified for Rec {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }
    }

    const fn rec(id: u32, v: &'static str) -> Rec {
        Rec { id, v }
    }

    #[test]
    fn persisted_wins_for_matching_id() {
        let merged = merge_by_id(vec![rec(1, "a")], vec![rec(1, "b")]);
        assert_eq!(merged, vec![rec(1, "b")]);
    }

    #[test]
    fn new_ids_from_both_sides_are_kept() {
        let merged = merge_by_id(vec![rec(1, "a")], vec![rec(2, "c")]);
        assert_eq!(merged, vec![rec(1, "a"), rec(2, "c")]);
    }

    #[test]
    fn seed_order_first_then_new_persisted_ids() {
        let merged = merge_by_id(
            vec![rec(3, "s3"), rec(1, "s1"), rec(2, "s2")],
            vec![rec(9, "p9"), rec(1, "p1"), rec(4, "p4")],
        );
        let ids: Vec<u32> = merged.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2, 9, 4]);
        assert_eq!(merged.get(1), Some(&rec(1, "p1")));
    }

    #[test]
    fn duplicate_persisted_ids_keep_last() {
        let merged = merge_by_id(Vec::new(), vec![rec(5, "x"), rec(5, "y")]);
        assert_eq!(merged, vec![rec(5, "y")]);
    }

    #[test]
    fn empty_inputs() {
        let merged: Vec<Rec> = merge_by_id(Vec::new(), Vec::new());
        assert!(merged.is_empty());
    }
}
