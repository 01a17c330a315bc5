/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for the [View] type and its associated methods.

use std::{
    cmp::Ordering,
    collections::{btree_set, BTreeSet},
    fmt::{self, Debug, Display, Formatter},
};

use borsh::{BorshDeserialize, BorshSerialize};

use super::basic::ProcessId;

/// The set of processes taking part in a broadcast round.
///
/// A view is compared by its member set only. Members are kept in ascending byte order of their
/// [process ids](ProcessId), so the Borsh encoding of a view (a little-endian `u32` member count followed
/// by each 32-byte id) is canonical: two processes that hold the same logical view always compute the
/// same bytes, and therefore the same signing input.
///
/// Views are never changed in place by the protocol. [merge](View::merge) and
/// [difference](View::difference) return new values.
///
/// # Ordering
///
/// `View` implements [`PartialOrd`] as the subset order: `a <= b` iff every member of `a` is a member
/// of `b`. Two views where neither contains the other are incomparable.
#[derive(Clone, Default, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct View(BTreeSet<ProcessId>);

impl View {
    pub fn new() -> View {
        View(BTreeSet::new())
    }

    pub fn is_member(&self, process: &ProcessId) -> bool {
        self.0.contains(process)
    }

    /// Check whether every member of this view is also a member of `other`.
    pub fn is_subview_of(&self, other: &View) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Number of members that any quorum of this view must contain.
    ///
    /// With `n` members this is `n - (n - 1) / 3`. Writing `f = (n - 1) / 3` for the number of tolerated
    /// faults, `n >= 3f + 1`, so any two quorums share at least `2(n - f) - n = n - 2f >= f + 1`
    /// members, at least one of which is correct.
    pub fn quorum_size(&self) -> usize {
        quorum_size(self.len())
    }

    /// Union of this view and `other`.
    pub fn merge(&self, other: &View) -> View {
        View(self.0.union(&other.0).copied().collect())
    }

    /// The members of this view that are not members of `other`.
    pub fn difference(&self, other: &View) -> View {
        View(self.0.difference(&other.0).copied().collect())
    }

    /// Get an iterator through the members' ids which walks through them in ascending order.
    pub fn members(&self) -> btree_set::Iter<ProcessId> {
        self.0.iter()
    }

    /// The members of this view as a set, e.g., to pass as the recipients of a dissemination.
    pub fn member_set(&self) -> &BTreeSet<ProcessId> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Quorum size of a view with `members` members. See [`View::quorum_size`].
pub fn quorum_size(members: usize) -> usize {
    members - members.saturating_sub(1) / 3
}

impl PartialOrd for View {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self.is_subview_of(other) {
            Some(Ordering::Less)
        } else if other.is_subview_of(self) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl FromIterator<ProcessId> for View {
    fn from_iter<T: IntoIterator<Item = ProcessId>>(iter: T) -> Self {
        View(iter.into_iter().collect())
    }
}

impl From<BTreeSet<ProcessId>> for View {
    fn from(value: BTreeSet<ProcessId>) -> Self {
        View(value)
    }
}

impl<'a> IntoIterator for &'a View {
    type Item = &'a ProcessId;
    type IntoIter = btree_set::Iter<'a, ProcessId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for View {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut leading_space = false;
        for member in &self.0 {
            if leading_space {
                write!(f, " ")?;
            }
            write!(f, "{}", member)?;
            leading_space = true;
        }
        write!(f, "]")
    }
}

impl Debug for View {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "View{}", self)
    }
}
