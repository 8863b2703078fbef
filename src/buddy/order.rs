//! Implicit tree addressing and order arithmetic
//!
//! Nodes live in a 1-indexed implicit binary tree: the root is index 1 and
//! the children of `i` are `2i` and `2i + 1`. Depth 0 holds the single
//! `MAX_ORDER` block covering the whole arena; every level below halves the
//! block size down to `MIN_ORDER` at depth `MAX_DEPTH`.

/// Smallest block order (1 KiB blocks).
pub const MIN_ORDER: usize = 10;

/// Largest block order (4 MiB blocks, the root).
pub const MAX_ORDER: usize = 22;

/// Number of tree depths between `MAX_ORDER` and `MIN_ORDER` inclusive.
pub const LEVELS: usize = MAX_ORDER - MIN_ORDER + 1;

/// Deepest level the search may reach.
pub const MAX_DEPTH: usize = LEVELS - 1;

/// Number of slots in the node array (index 0 unused).
pub const TREE_SIZE: usize = 1 << (LEVELS + 1);

/// Size of the arena managed by the root block.
pub const ARENA_BYTES: u64 = 1 << MAX_ORDER;

/// Bytes per KiB, used for request and report unit conversion.
pub const KB: u64 = 1024;

/// Block order of nodes at `depth`.
#[inline]
pub const fn order_for_depth(depth: usize) -> usize {
    debug_assert!(depth <= MAX_DEPTH);
    MAX_ORDER - depth
}

/// Block size in bytes of nodes at `depth`.
#[inline]
pub const fn block_size_for_depth(depth: usize) -> u64 {
    1u64 << order_for_depth(depth)
}

/// Depth of node `index`: the unique `d` with `2^d <= index < 2^(d+1)`.
///
/// Returns `None` for index 0, which is not a tree slot.
#[inline]
pub const fn depth_for_index(index: usize) -> Option<usize> {
    match index.checked_ilog2() {
        Some(depth) => Some(depth as usize),
        None => None,
    }
}

/// Byte offset of node `index` within the arena.
///
/// `depth` must be the depth of `index`; the first node of each level sits
/// at offset 0.
#[inline]
pub const fn offset_for_node(index: usize, depth: usize) -> u64 {
    let level_start = 1usize << depth;
    debug_assert!(index >= level_start && index < level_start << 1);
    (index - level_start) as u64 * block_size_for_depth(depth)
}

/// Smallest order whose block holds `size_bytes`.
///
/// Requests below the minimum block size round up to `MIN_ORDER`; requests
/// above `2^MAX_ORDER` cannot be placed in any block and yield `None`.
#[inline]
pub const fn order_needed(size_bytes: u64) -> Option<usize> {
    if size_bytes > ARENA_BYTES {
        return None;
    }
    let order = size_bytes.next_power_of_two().trailing_zeros() as usize;
    if order < MIN_ORDER {
        Some(MIN_ORDER)
    } else {
        Some(order)
    }
}

/// Tree depth at which a block of `order` lives.
#[inline]
pub const fn depth_for_order(order: usize) -> usize {
    debug_assert!(order >= MIN_ORDER && order <= MAX_ORDER);
    MAX_ORDER - order
}

/// Parent slot of `index`, or `None` for the root.
#[inline]
pub const fn parent_index(index: usize) -> Option<usize> {
    if index > 1 {
        Some(index >> 1)
    } else {
        None
    }
}

/// Left and right child slots of `index`.
#[inline]
pub const fn child_indices(index: usize) -> (usize, usize) {
    let left = index << 1;
    (left, left + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_constants() {
        assert_eq!(LEVELS, 13);
        assert_eq!(MAX_DEPTH, 12);
        assert_eq!(TREE_SIZE, 16384);
        assert_eq!(ARENA_BYTES, 4 * 1024 * 1024);
    }

    #[test]
    fn test_order_and_size_for_depth() {
        assert_eq!(order_for_depth(0), MAX_ORDER);
        assert_eq!(order_for_depth(MAX_DEPTH), MIN_ORDER);
        assert_eq!(block_size_for_depth(0), ARENA_BYTES);
        assert_eq!(block_size_for_depth(MAX_DEPTH), KB);
        assert_eq!(block_size_for_depth(10), 4 * KB);
    }

    #[test]
    fn test_depth_for_index() {
        assert_eq!(depth_for_index(0), None);
        assert_eq!(depth_for_index(1), Some(0));
        assert_eq!(depth_for_index(2), Some(1));
        assert_eq!(depth_for_index(3), Some(1));
        assert_eq!(depth_for_index(4), Some(2));
        assert_eq!(depth_for_index(7), Some(2));
        assert_eq!(depth_for_index(4096), Some(12));
        assert_eq!(depth_for_index(8191), Some(12));
    }

    #[test]
    fn test_offset_for_node() {
        assert_eq!(offset_for_node(1, 0), 0);
        assert_eq!(offset_for_node(2, 1), 0);
        assert_eq!(offset_for_node(3, 1), 2 * 1024 * 1024);
        assert_eq!(offset_for_node(4097, 12), KB);
        assert_eq!(offset_for_node(8191, 12), ARENA_BYTES - KB);
    }

    #[test]
    fn test_order_needed_rounds_up() {
        assert_eq!(order_needed(0), Some(MIN_ORDER));
        assert_eq!(order_needed(1), Some(MIN_ORDER));
        assert_eq!(order_needed(KB), Some(10));
        assert_eq!(order_needed(KB + 1), Some(11));
        assert_eq!(order_needed(3 * KB), Some(12));
        assert_eq!(order_needed(ARENA_BYTES), Some(MAX_ORDER));
        assert_eq!(order_needed(ARENA_BYTES + 1), None);
        assert_eq!(order_needed(u64::MAX), None);
    }

    #[test]
    fn test_parent_and_children() {
        assert_eq!(parent_index(1), None);
        assert_eq!(parent_index(2), Some(1));
        assert_eq!(parent_index(3), Some(1));
        assert_eq!(parent_index(13), Some(6));
        assert_eq!(child_indices(1), (2, 3));
        assert_eq!(child_indices(6), (12, 13));
    }
}
