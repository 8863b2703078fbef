//! Implicit binary buddy tree
//!
//! Tracks occupancy of the arena with one node per tree slot. Allocation
//! walks the tree depth-first from the root, splitting free blocks on the
//! way down until it reaches a free block of the required order. Nodes only
//! ever move from `Free` to `Split` or from `Free` to `Occupied`.

use alloc::{borrow::ToOwned, vec::Vec};

use crate::{AllocError, AllocResult};

#[cfg(feature = "log")]
use log::{debug, error, info, trace};

use super::{
    buddy_node::{BlockInfo, BuddyNode, NodeStatus, Occupant, OccupiedBlock},
    order::{
        child_indices, depth_for_order, order_needed, parent_index, ARENA_BYTES, MAX_DEPTH,
        TREE_SIZE,
    },
};

#[cfg(feature = "log")]
use super::order::{KB, MAX_ORDER};

#[cfg(feature = "tracking")]
use super::stats::{AllocCounters, TreeStats};

/// Buddy allocator over a single `2^MAX_ORDER` arena
///
/// Slots that were never materialized are `None`; only the root exists
/// before the first split.
#[derive(Debug)]
pub struct BuddyTree {
    nodes: Vec<Option<BuddyNode>>,
    #[cfg(feature = "tracking")]
    counters: AllocCounters,
}

impl BuddyTree {
    /// Create a tree whose root covers the whole arena and is free.
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(TREE_SIZE);
        nodes.resize_with(TREE_SIZE, || None);
        nodes[1] = Some(BuddyNode::Free);
        Self {
            nodes,
            #[cfg(feature = "tracking")]
            counters: AllocCounters::default(),
        }
    }

    /// Total bytes managed by the tree.
    pub const fn arena_bytes(&self) -> u64 {
        ARENA_BYTES
    }

    /// Place a request of `size_bytes` in the leftmost free block of the
    /// smallest order that holds it.
    ///
    /// Returns the index of the occupied node. The request size is stored
    /// unrounded alongside `label`.
    pub fn allocate(&mut self, label: &str, size_bytes: u64) -> AllocResult<usize> {
        let Some(order) = order_needed(size_bytes) else {
            debug!(
                "buddy tree: '{}' needs {} B, larger than the {} B arena",
                label, size_bytes, ARENA_BYTES
            );
            #[cfg(feature = "tracking")]
            {
                self.counters.capacity_failures += 1;
            }
            return Err(AllocError::ExceedsCapacity {
                requested: size_bytes,
                max: ARENA_BYTES,
            });
        };

        let target_depth = depth_for_order(order);
        match self.search(1, 0, target_depth, label, size_bytes) {
            Some(index) => {
                #[cfg(feature = "tracking")]
                {
                    self.counters.allocations += 1;
                }
                debug!(
                    "buddy tree: placed '{}' ({} B) at node {} (order {})",
                    label, size_bytes, index, order
                );
                Ok(index)
            }
            None => {
                debug!(
                    "buddy tree: no free order {} block left for '{}' ({} B)",
                    order, label, size_bytes
                );
                #[cfg(feature = "tracking")]
                {
                    self.counters.fragmentation_failures += 1;
                }
                Err(AllocError::NoFit { order })
            }
        }
    }

    /// Left-biased depth-first search for a free node at `target_depth`.
    fn search(
        &mut self,
        index: usize,
        depth: usize,
        target_depth: usize,
        label: &str,
        size_bytes: u64,
    ) -> Option<usize> {
        debug_assert!(depth <= MAX_DEPTH, "search below the minimum order");
        if depth > MAX_DEPTH || index >= TREE_SIZE {
            error!(
                "buddy tree: search left the tree at node {} (depth {})",
                index, depth
            );
            return None;
        }

        debug_assert!(self.nodes[index].is_some(), "unmaterialized node reached");
        let Some(status) = self.nodes[index].as_ref().map(BuddyNode::status) else {
            error!("buddy tree: node {} reached but never materialized", index);
            return None;
        };

        match status {
            NodeStatus::Occupied => None,
            NodeStatus::Free if depth == target_depth => {
                self.nodes[index] = Some(BuddyNode::Occupied(Occupant {
                    label: label.to_owned(),
                    requested_bytes: size_bytes,
                }));
                Some(index)
            }
            NodeStatus::Free if depth < target_depth => {
                self.split(index, depth);
                self.search_children(index, depth, target_depth, label, size_bytes)
            }
            NodeStatus::Free => None,
            NodeStatus::Split => {
                self.search_children(index, depth, target_depth, label, size_bytes)
            }
        }
    }

    fn search_children(
        &mut self,
        index: usize,
        depth: usize,
        target_depth: usize,
        label: &str,
        size_bytes: u64,
    ) -> Option<usize> {
        let (left, right) = child_indices(index);
        self.search(left, depth + 1, target_depth, label, size_bytes)
            .or_else(|| self.search(right, depth + 1, target_depth, label, size_bytes))
    }

    /// Turn a free node into two free buddies.
    #[allow(unused_variables)]
    fn split(&mut self, index: usize, depth: usize) {
        let (left, right) = child_indices(index);
        trace!(
            "buddy tree: split node {} (order {}) into {} and {}",
            index,
            MAX_ORDER - depth,
            left,
            right
        );
        self.nodes[index] = Some(BuddyNode::Split);
        self.nodes[left] = Some(BuddyNode::Free);
        self.nodes[right] = Some(BuddyNode::Free);
        #[cfg(feature = "tracking")]
        {
            self.counters.splits += 1;
        }
    }

    /// State of node `index`, or `None` if it was never materialized.
    pub fn node(&self, index: usize) -> Option<&BuddyNode> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    /// Geometry of node `index`, whether or not it is materialized.
    pub fn block(&self, index: usize) -> Option<BlockInfo> {
        if index >= TREE_SIZE {
            return None;
        }
        BlockInfo::for_index(index)
    }

    /// Every materialized node in index order (level by level, left to right).
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BuddyNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, node)| node.as_ref().map(|node| (index, node)))
    }

    /// Whether some strict ancestor of `index` has the given status.
    fn has_ancestor_with(&self, index: usize, status: NodeStatus) -> bool {
        let mut current = parent_index(index);
        while let Some(parent) = current {
            if self.node(parent).map(BuddyNode::status) == Some(status) {
                return true;
            }
            current = parent_index(parent);
        }
        false
    }

    /// Maximal free blocks: free nodes with no free ancestor.
    pub fn free_blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        self.iter()
            .filter(move |(index, node)| {
                node.is_free() && !self.has_ancestor_with(*index, NodeStatus::Free)
            })
            .filter_map(move |(index, _)| self.block(index))
    }

    /// Maximal occupied blocks: occupied nodes with no occupied ancestor.
    pub fn occupied_blocks(&self) -> impl Iterator<Item = OccupiedBlock<'_>> + '_ {
        self.iter().filter_map(move |(index, node)| {
            let occupant = node.occupant()?;
            if self.has_ancestor_with(index, NodeStatus::Occupied) {
                return None;
            }
            Some(OccupiedBlock {
                block: self.block(index)?,
                label: &occupant.label,
                requested_bytes: occupant.requested_bytes,
            })
        })
    }

    /// Sum of the sizes of all maximal free blocks.
    pub fn total_free_bytes(&self) -> u64 {
        self.free_blocks().map(|block| block.size).sum()
    }

    /// Number of maximal free blocks.
    pub fn count_free_blocks(&self) -> usize {
        self.free_blocks().count()
    }

    /// Aggregate occupancy snapshot plus allocation counters.
    #[cfg(feature = "tracking")]
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::new();
        stats.arena_bytes = ARENA_BYTES;
        stats.counters = self.counters;

        for block in self.free_blocks() {
            stats.free_bytes += block.size;
            stats.free_blocks += 1;
            stats.free_blocks_by_depth[block.depth] += 1;
        }
        for occupied in self.occupied_blocks() {
            stats.occupied_bytes += occupied.block.size;
            stats.requested_bytes += occupied.requested_bytes;
            stats.occupied_blocks += 1;
        }
        stats
    }

    /// Print every materialized node with its geometry
    #[allow(unused_variables)]
    pub fn print_tree_info(&self) {
        info!("========== Buddy Tree ==========");
        info!("Arena: {} B ({} KB)", ARENA_BYTES, ARENA_BYTES / KB);
        for (index, node) in self.iter() {
            if let Some(block) = self.block(index) {
                info!(
                    "  node {:>5} depth {:>2} order {:>2} offset {:>8} KB size {:>5} KB: {:?}",
                    index,
                    block.depth,
                    block.order,
                    block.offset / KB,
                    block.size / KB,
                    node
                );
            }
        }
        info!("================================");
    }
}

impl Default for BuddyTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buddy::order::{KB, LEVELS, MAX_ORDER, MIN_ORDER};

    #[test]
    fn test_new_tree_has_only_root() {
        let tree = BuddyTree::new();
        assert_eq!(tree.node(1), Some(&BuddyNode::Free));
        assert_eq!(tree.node(2), None);
        assert_eq!(tree.iter().count(), 1);
        assert_eq!(tree.total_free_bytes(), ARENA_BYTES);
        assert_eq!(tree.count_free_blocks(), 1);
    }

    #[test]
    fn test_allocate_splits_down_left_spine() {
        let mut tree = BuddyTree::new();
        let index = tree.allocate("A", KB).unwrap();

        assert_eq!(index, 1 << MAX_DEPTH);
        let mut current = parent_index(index);
        while let Some(parent) = current {
            assert_eq!(tree.node(parent), Some(&BuddyNode::Split));
            current = parent_index(parent);
        }
        // One free buddy per split level.
        assert_eq!(tree.count_free_blocks(), LEVELS - 1);
        assert_eq!(tree.total_free_bytes(), ARENA_BYTES - KB);
    }

    #[test]
    fn test_occupant_keeps_unrounded_size() {
        let mut tree = BuddyTree::new();
        let index = tree.allocate("req", 3 * KB).unwrap();
        let occupant = tree.node(index).and_then(BuddyNode::occupant).unwrap();
        assert_eq!(occupant.label, "req");
        assert_eq!(occupant.requested_bytes, 3 * KB);
        assert_eq!(tree.block(index).unwrap().order, 12);
    }

    #[test]
    fn test_occupied_node_is_not_descended() {
        let mut tree = BuddyTree::new();
        assert_eq!(tree.allocate("big", ARENA_BYTES), Ok(1));
        assert_eq!(
            tree.allocate("small", KB),
            Err(AllocError::NoFit { order: MIN_ORDER })
        );
        assert_eq!(tree.node(2), None);
        assert_eq!(tree.count_free_blocks(), 0);
    }

    #[test]
    fn test_failed_search_keeps_splits() {
        let mut tree = BuddyTree::new();
        // Occupy the left half, then fill the right half with a 1 MiB and a
        // 512 KiB block so only 512 KiB remains on the right.
        tree.allocate("left", ARENA_BYTES / 2).unwrap();
        tree.allocate("q1", ARENA_BYTES / 4).unwrap();
        tree.allocate("q2", ARENA_BYTES / 8).unwrap();

        assert_eq!(
            tree.allocate("too-big", ARENA_BYTES / 4),
            Err(AllocError::NoFit { order: MAX_ORDER - 2 })
        );
        assert_eq!(tree.total_free_bytes(), ARENA_BYTES / 8);

        // The remaining 512 KiB block is still findable.
        assert!(tree.allocate("fits", ARENA_BYTES / 8).is_ok());
        assert_eq!(tree.total_free_bytes(), 0);
    }

    #[test]
    fn test_block_out_of_range() {
        let tree = BuddyTree::new();
        assert_eq!(tree.block(0), None);
        assert_eq!(tree.block(TREE_SIZE), None);
        assert!(tree.block(TREE_SIZE - 1).is_none());
        assert!(tree.block((1 << LEVELS) - 1).is_some());
    }

    #[cfg(feature = "tracking")]
    #[test]
    fn test_stats_counters() {
        let mut tree = BuddyTree::new();
        tree.allocate("a", 3 * KB).unwrap();
        tree.allocate("b", KB).unwrap();
        assert!(tree.allocate("huge", ARENA_BYTES + 1).is_err());

        let stats = tree.stats();
        assert_eq!(stats.counters.allocations, 2);
        assert_eq!(stats.counters.capacity_failures, 1);
        assert_eq!(stats.counters.fragmentation_failures, 0);
        assert_eq!(stats.counters.splits, 12);
        assert_eq!(stats.occupied_bytes, 5 * KB);
        assert_eq!(stats.requested_bytes, 4 * KB);
        assert_eq!(stats.internal_fragmentation(), KB);
        assert_eq!(stats.free_bytes + stats.occupied_bytes, ARENA_BYTES);
    }

    #[cfg(feature = "tracking")]
    #[test]
    fn test_fragmentation_failure_only_bumps_counter() {
        let mut tree = BuddyTree::new();
        tree.allocate("left", ARENA_BYTES / 2).unwrap();
        tree.allocate("right", ARENA_BYTES / 2).unwrap();
        let before = tree.stats();

        assert_eq!(
            tree.allocate("late", KB),
            Err(AllocError::NoFit { order: MIN_ORDER })
        );

        let after = tree.stats();
        assert_eq!(after.counters.fragmentation_failures, 1);
        assert_eq!(after.counters.splits, before.counters.splits);
        assert_eq!(after.counters.allocations, before.counters.allocations);
        assert_eq!(after.free_bytes, before.free_bytes);
        assert_eq!(after.occupied_blocks, before.occupied_blocks);
        assert_eq!(tree.node(4), None);
    }
}
