//! Buddy tree module
//!
//! This module provides the buddy-tree engine with:
//! - Implicit tree addressing and order arithmetic
//! - Tagged per-node state
//! - Split-and-search allocation and maximal block accounting
//! - Statistics and failure reporting (`tracking` feature)

pub mod buddy_node;
pub mod buddy_tree;
pub mod order;
#[cfg(feature = "tracking")]
pub mod stats;

pub use buddy_node::{BlockInfo, BuddyNode, NodeStatus, Occupant, OccupiedBlock};
pub use buddy_tree::BuddyTree;
pub use order::{
    block_size_for_depth, depth_for_index, offset_for_node, order_for_depth, order_needed,
    ARENA_BYTES, KB, LEVELS, MAX_DEPTH, MAX_ORDER, MIN_ORDER, TREE_SIZE,
};
#[cfg(feature = "tracking")]
pub use stats::{AllocCounters, StatsReporter, TreeStats};
