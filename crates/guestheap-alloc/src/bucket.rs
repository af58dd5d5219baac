//! Segregated free chains for the eight most common small sizes.
//!
//! Structs and short arrays compiled by the guest almost always land in
//! one of the sizes 4, 8, ..., 32. Each of those sizes gets its own
//! singly linked chain so both allocate and free are O(1) with no search
//! and no splitting.
//!
//! ```text
//! index:  0    1    2    3    4    5    6    7
//! size:   4    8    12   16   20   24   28   32
//! head:   ─┐   ∅    ─┐   ∅    ∅    ∅    ∅    ─┐
//!          ▼         ▼                        ▼
//!        [blk]─►∅  [blk]─►[blk]─►∅          [blk]─►∅
//! ```
//!
//! Buckets are sealed off from the general chain in both directions: an
//! empty bucket goes to the wilderness, never to the general pool.

use guestheap_core::{BlockAddr, LinearMemory};

use crate::block;

/// Number of bucket size classes.
pub const BUCKET_COUNT: usize = 8;

/// Payload sizes served by buckets, indexed by [`bucket_index`].
pub const BUCKET_SIZES: [u32; BUCKET_COUNT] = [4, 8, 12, 16, 20, 24, 28, 32];

/// Bucket index for an exact payload size, or `None` for general sizes.
///
/// Only multiples of 4 in `4..=32` map to a bucket; the index is
/// `size / 4 - 1`.
pub fn bucket_index(size: u32) -> Option<usize> {
    if size == 0 || size % 4 != 0 || size > BUCKET_SIZES[BUCKET_COUNT - 1] {
        return None;
    }
    Some((size / 4 - 1) as usize)
}

/// Heads of the eight bucket chains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BucketTable {
    heads: [Option<BlockAddr>; BUCKET_COUNT],
}

impl BucketTable {
    /// Create a table with every chain empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the most recently freed block from bucket `index`.
    ///
    /// The block's header already holds the bucket size from its earlier
    /// life, so it is returned as-is. Returns `None` if the chain is empty.
    pub fn pop<M: LinearMemory + ?Sized>(&mut self, mem: &M, index: usize) -> Option<BlockAddr> {
        let head = self.heads[index]?;
        self.heads[index] = block::next_of(mem, head);
        Some(head)
    }

    /// Push a freed block onto bucket `index`.
    ///
    /// Writes the current head into the block's forward-pointer slot. The
    /// header is left alone.
    pub fn push<M: LinearMemory + ?Sized>(&mut self, mem: &mut M, index: usize, block: BlockAddr) {
        block::set_next(mem, block, self.heads[index]);
        self.heads[index] = Some(block);
    }

    /// Current head of bucket `index`.
    pub fn head(&self, index: usize) -> Option<BlockAddr> {
        self.heads[index]
    }

    /// Whether every bucket chain is empty.
    pub fn is_empty(&self) -> bool {
        self.heads.iter().all(Option::is_none)
    }
}
