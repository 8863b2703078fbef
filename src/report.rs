//! Human-readable rendering of placements and tree state.
//!
//! Every size and offset is shown in bytes followed by whole KiB.

use core::fmt::{self, Display, Formatter, Write};
use core::time::Duration;

use crate::buddy::{BlockInfo, BuddyTree, OccupiedBlock, KB};
use crate::AllocResult;

#[cfg(feature = "tracking")]
use crate::buddy::{block_size_for_depth, TreeStats, MAX_ORDER};

/// A byte count rendered as `NB (M KB)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bytes(pub u64);

impl Display for Bytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}B ({} KB)", self.0, self.0 / KB)
    }
}

/// Outcome line for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementLine<'a> {
    pub label: &'a str,
    /// The block the request landed in, `None` if it was not placed.
    pub block: Option<BlockInfo>,
}

impl<'a> PlacementLine<'a> {
    pub fn new(tree: &BuddyTree, label: &'a str, result: &AllocResult<usize>) -> Self {
        Self {
            label,
            block: result.as_ref().ok().and_then(|&index| tree.block(index)),
        }
    }
}

impl Display for PlacementLine<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.block {
            Some(block) => write!(
                f,
                "Allocated {} block={} offset={}",
                self.label,
                Bytes(block.size),
                Bytes(block.offset)
            ),
            None => write!(f, "Failed to allocate {}", self.label),
        }
    }
}

struct FreeBlockLine(BlockInfo);

impl Display for FreeBlockLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  start={} size={}",
            Bytes(self.0.offset),
            Bytes(self.0.size)
        )
    }
}

struct OccupiedBlockLine<'a>(OccupiedBlock<'a>);

impl Display for OccupiedBlockLine<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {} requested={} block={} offset={}",
            self.0.label,
            Bytes(self.0.requested_bytes),
            Bytes(self.0.block.size),
            Bytes(self.0.block.offset)
        )
    }
}

/// Timing of one batch of requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub elapsed: Duration,
}

impl Display for BatchSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Benchmark:")?;
        writeln!(f, "Processed: {}", self.processed)?;
        write!(f, "Time: {} s", self.elapsed.as_secs_f64())
    }
}

/// Write the free total, the free block count and both block listings.
pub fn write_report<W: Write>(tree: &BuddyTree, out: &mut W) -> fmt::Result {
    writeln!(out, "Report:")?;
    writeln!(out, "Free: {}", Bytes(tree.total_free_bytes()))?;
    writeln!(out, "Free block count: {}", tree.count_free_blocks())?;

    writeln!(out)?;
    writeln!(out, "Free blocks:")?;
    for block in tree.free_blocks() {
        writeln!(out, "{}", FreeBlockLine(block))?;
    }

    writeln!(out)?;
    writeln!(out, "Allocated blocks:")?;
    for occupied in tree.occupied_blocks() {
        writeln!(out, "{}", OccupiedBlockLine(occupied))?;
    }
    Ok(())
}

/// Write the statistics block printed by `buddy-sim --stats`.
#[cfg(feature = "tracking")]
pub fn write_stats<W: Write>(stats: &TreeStats, out: &mut W) -> fmt::Result {
    writeln!(out, "Statistics:")?;
    writeln!(out, "Arena: {}", Bytes(stats.arena_bytes))?;
    writeln!(
        out,
        "Occupied: {} in {} blocks",
        Bytes(stats.occupied_bytes),
        stats.occupied_blocks
    )?;
    writeln!(out, "Requested: {}", Bytes(stats.requested_bytes))?;
    writeln!(
        out,
        "Internal fragmentation: {}",
        Bytes(stats.internal_fragmentation())
    )?;
    match stats.largest_free_block() {
        Some(size) => writeln!(out, "Largest free block: {}", Bytes(size))?,
        None => writeln!(out, "Largest free block: none")?,
    }
    writeln!(
        out,
        "Allocations: {} placed, {} too large, {} fragmented, {} splits",
        stats.counters.allocations,
        stats.counters.capacity_failures,
        stats.counters.fragmentation_failures,
        stats.counters.splits
    )?;
    writeln!(out, "Free blocks by order:")?;
    for (depth, &count) in stats.free_blocks_by_depth.iter().enumerate() {
        if count > 0 {
            writeln!(
                out,
                "  order {}: {} x {} KB",
                MAX_ORDER - depth,
                count,
                block_size_for_depth(depth) / KB
            )?;
        }
    }
    Ok(())
}
