//! Shared buddy tree behind a spin lock.
//!
//! A split or an occupy writes several node slots in a row, so every
//! `allocate` and every aggregate query runs under one exclusive lock.
//! Reports that combine several queries should take the lock once through
//! [`LockedBuddyTree::with_tree`].

use kspin::SpinNoIrq;

use crate::buddy::BuddyTree;
use crate::AllocResult;

#[cfg(feature = "tracking")]
use crate::buddy::TreeStats;

/// Buddy tree that can be shared between threads
pub struct LockedBuddyTree {
    tree: SpinNoIrq<BuddyTree>,
}

impl LockedBuddyTree {
    pub fn new() -> Self {
        Self::from_tree(BuddyTree::new())
    }

    /// Wrap an existing tree, keeping its current placements.
    pub fn from_tree(tree: BuddyTree) -> Self {
        Self {
            tree: SpinNoIrq::new(tree),
        }
    }

    /// Place a labelled request; see [`BuddyTree::allocate`].
    pub fn allocate(&self, label: &str, size_bytes: u64) -> AllocResult<usize> {
        self.tree.lock().allocate(label, size_bytes)
    }

    pub fn total_free_bytes(&self) -> u64 {
        self.tree.lock().total_free_bytes()
    }

    pub fn count_free_blocks(&self) -> usize {
        self.tree.lock().count_free_blocks()
    }

    #[cfg(feature = "tracking")]
    pub fn stats(&self) -> TreeStats {
        self.tree.lock().stats()
    }

    /// Run `f` with the tree locked for the whole call.
    pub fn with_tree<R>(&self, f: impl FnOnce(&BuddyTree) -> R) -> R {
        f(&self.tree.lock())
    }

    /// Give back the inner tree.
    pub fn into_inner(self) -> BuddyTree {
        self.tree.into_inner()
    }
}

impl Default for LockedBuddyTree {
    fn default() -> Self {
        Self::new()
    }
}
