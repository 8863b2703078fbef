//! Buddy tree node state and block metadata
//!
//! A node is either free, split into two buddies, or occupied by a labelled
//! request. Block geometry (depth, order, size, offset) is never stored; it
//! is derived from the node index.

use alloc::string::String;

use super::order::{
    block_size_for_depth, depth_for_index, offset_for_node, order_for_depth, MAX_DEPTH,
};

/// Owner of an occupied block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub label: String,
    /// Size originally asked for, before rounding up to the block size.
    pub requested_bytes: u64,
}

/// State of a materialized tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuddyNode {
    /// The whole block is available.
    Free,
    /// The block was divided; both children are materialized.
    Split,
    /// The whole block belongs to one request.
    Occupied(Occupant),
}

/// Payload-free view of a node state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Free,
    Split,
    Occupied,
}

impl BuddyNode {
    pub const fn status(&self) -> NodeStatus {
        match self {
            Self::Free => NodeStatus::Free,
            Self::Split => NodeStatus::Split,
            Self::Occupied(_) => NodeStatus::Occupied,
        }
    }

    pub const fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    pub const fn is_occupied(&self) -> bool {
        matches!(self, Self::Occupied(_))
    }

    /// The occupant, if this block is occupied.
    pub fn occupant(&self) -> Option<&Occupant> {
        match self {
            Self::Occupied(occupant) => Some(occupant),
            _ => None,
        }
    }
}

/// Geometry of one block in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub index: usize,
    pub depth: usize,
    pub order: usize,
    pub size: u64,
    pub offset: u64,
}

impl BlockInfo {
    /// Derive the geometry of node `index`.
    ///
    /// Index 0 and slots below the minimum block order yield `None`.
    pub const fn for_index(index: usize) -> Option<Self> {
        let depth = match depth_for_index(index) {
            Some(depth) if depth <= MAX_DEPTH => depth,
            _ => return None,
        };
        Some(Self {
            index,
            depth,
            order: order_for_depth(depth),
            size: block_size_for_depth(depth),
            offset: offset_for_node(index, depth),
        })
    }

    /// One past the last byte of the block.
    pub const fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// Whether the half-open ranges of the two blocks intersect.
    pub const fn overlaps(&self, other: &BlockInfo) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

impl PartialOrd for BlockInfo {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BlockInfo {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.offset
            .cmp(&other.offset)
            .then(other.size.cmp(&self.size))
    }
}

/// A maximal occupied block together with its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupiedBlock<'a> {
    pub block: BlockInfo,
    pub label: &'a str,
    pub requested_bytes: u64,
}

impl OccupiedBlock<'_> {
    /// Bytes lost to rounding the request up to a power of two.
    pub const fn internal_fragmentation(&self) -> u64 {
        self.block.size.saturating_sub(self.requested_bytes)
    }
}
