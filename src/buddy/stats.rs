//! Statistics and debugging for the buddy tree
//!
//! Provides aggregate occupancy figures and failure reporting.

use super::order::{block_size_for_depth, LEVELS};

#[cfg(feature = "log")]
use super::order::{KB, MAX_ORDER};

/// Running counters kept by the tree across `allocate` calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocCounters {
    pub allocations: usize,
    pub capacity_failures: usize,
    pub fragmentation_failures: usize,
    pub splits: usize,
}

/// Buddy tree statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub arena_bytes: u64,
    pub free_bytes: u64,
    /// Sum of block sizes handed out.
    pub occupied_bytes: u64,
    /// Sum of the unrounded request sizes behind `occupied_bytes`.
    pub requested_bytes: u64,
    pub free_blocks: usize,
    pub occupied_blocks: usize,
    /// Maximal free blocks per depth; index 0 is the `MAX_ORDER` level.
    pub free_blocks_by_depth: [usize; LEVELS],
    pub counters: AllocCounters,
}

impl Default for TreeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStats {
    pub const fn new() -> Self {
        Self {
            arena_bytes: 0,
            free_bytes: 0,
            occupied_bytes: 0,
            requested_bytes: 0,
            free_blocks: 0,
            occupied_blocks: 0,
            free_blocks_by_depth: [0; LEVELS],
            counters: AllocCounters {
                allocations: 0,
                capacity_failures: 0,
                fragmentation_failures: 0,
                splits: 0,
            },
        }
    }

    /// Bytes lost to rounding requests up to block sizes.
    pub const fn internal_fragmentation(&self) -> u64 {
        self.occupied_bytes.saturating_sub(self.requested_bytes)
    }

    /// Size of the largest free block, if any block is free.
    pub fn largest_free_block(&self) -> Option<u64> {
        self.free_blocks_by_depth
            .iter()
            .position(|&count| count > 0)
            .map(block_size_for_depth)
    }
}

/// Logs tree statistics when something goes wrong
pub struct StatsReporter;

impl StatsReporter {
    /// Print detailed allocation failure statistics
    #[allow(unused_variables)]
    pub fn log_alloc_failure(stats: &TreeStats, label: &str, request_bytes: u64) {
        #[cfg(feature = "log")]
        use log::debug;

        debug!("========================================");
        debug!(
            "Request '{}': {} B ({} KB)",
            label,
            request_bytes,
            request_bytes / KB
        );
        debug!(
            "  Free: {} B ({} KB) in {} blocks",
            stats.free_bytes,
            stats.free_bytes / KB,
            stats.free_blocks
        );
        debug!(
            "  Occupied: {} B ({} KB) in {} blocks, {} B lost to rounding",
            stats.occupied_bytes,
            stats.occupied_bytes / KB,
            stats.occupied_blocks,
            stats.internal_fragmentation()
        );
        debug!("  Free blocks by order:");
        for (depth, &count) in stats.free_blocks_by_depth.iter().enumerate() {
            if count > 0 {
                let block_size = block_size_for_depth(depth);
                debug!(
                    "    Order {}: {} blocks ({} KB each, {} KB total)",
                    MAX_ORDER - depth,
                    count,
                    block_size / KB,
                    count as u64 * block_size / KB
                );
            }
        }
        debug!("========================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buddy::order::{ARENA_BYTES, KB, MAX_DEPTH};

    #[test]
    fn test_largest_free_block() {
        let mut stats = TreeStats::new();
        assert_eq!(stats.largest_free_block(), None);

        stats.free_blocks_by_depth[MAX_DEPTH] = 3;
        assert_eq!(stats.largest_free_block(), Some(KB));

        stats.free_blocks_by_depth[0] = 1;
        assert_eq!(stats.largest_free_block(), Some(ARENA_BYTES));
    }

    #[test]
    fn test_internal_fragmentation() {
        let stats = TreeStats {
            occupied_bytes: 4 * KB,
            requested_bytes: 3 * KB,
            ..TreeStats::new()
        };
        assert_eq!(stats.internal_fragmentation(), KB);
    }
}
