//! Buddy tree allocator simulator
//!
//! This crate models a binary buddy-system allocator over a fixed arena,
//! featuring:
//! - Implicit binary tree addressing (root = 1, children `2i`, `2i + 1`)
//! - Left-biased depth-first split-and-search placement of labelled requests
//! - Maximal free/occupied block accounting for reporting
//! - A spin-locked wrapper for callers that share one tree
//! - Request line parsing and report rendering for the `buddy-sim` driver

#![no_std]

extern crate alloc;

// Logging support - conditionally import log crate
#[cfg(feature = "log")]
extern crate log;

// Stub macros when log is disabled - these become no-ops
#[cfg(not(feature = "log"))]
macro_rules! error {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
#[allow(unused_macros)]
macro_rules! warn {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
macro_rules! info {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

use thiserror::Error;

/// The error type used for allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The request is larger than the biggest block the tree can hand out.
    #[error("request of {requested} B exceeds the largest block ({max} B)")]
    ExceedsCapacity { requested: u64, max: u64 },
    /// No free block of the required order is left.
    #[error("no free block of order {order} left")]
    NoFit { order: usize },
}

impl AllocError {
    /// Whether the failure is due to fragmentation rather than request size.
    pub const fn is_fragmentation(&self) -> bool {
        matches!(self, Self::NoFit { .. })
    }
}

/// A [`Result`] type with [`AllocError`] as the error type.
pub type AllocResult<T = ()> = Result<T, AllocError>;

// Export our allocator implementations
pub mod buddy;
#[cfg(feature = "tracking")]
pub use buddy::{AllocCounters, StatsReporter, TreeStats};
pub use buddy::{
    block_size_for_depth, depth_for_index, offset_for_node, order_for_depth, order_needed,
    BlockInfo, BuddyNode, BuddyTree, NodeStatus, Occupant, OccupiedBlock, ARENA_BYTES, KB,
    LEVELS, MAX_DEPTH, MAX_ORDER, MIN_ORDER, TREE_SIZE,
};

pub mod locked;
pub use locked::LockedBuddyTree;

pub mod request;
pub use request::{parse_line, parse_requests, Request, RequestError};

pub mod report;
#[cfg(feature = "tracking")]
pub use report::write_stats;
pub use report::{write_report, BatchSummary, Bytes, PlacementLine};
