//! Allocation counters and free-chain reports.
//!
//! [`HeapStats`] is maintained incrementally by every heap operation and
//! is cheap to copy out. [`ChainReport`] is computed on demand by walking
//! every free chain through linear memory, so its cost grows with
//! fragmentation.

use crate::bucket::{BUCKET_COUNT, BUCKET_SIZES};

/// Running counters for one heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Allocations served by carving new memory from the wilderness.
    pub wilderness_allocs: u64,
    /// Allocations served by popping a bucket chain.
    pub bucket_reuses: u64,
    /// Allocations served from the general chain (whole or split).
    pub general_reuses: u64,
    /// General-chain hits that split the matched block.
    pub splits: u64,
    /// Frees routed to a bucket chain (split remainders included).
    pub bucket_frees: u64,
    /// Frees routed to the general chain (split remainders included).
    pub general_frees: u64,
}

impl HeapStats {
    /// Total allocations served by any path.
    pub fn allocations(&self) -> u64 {
        self.wilderness_allocs + self.bucket_reuses + self.general_reuses
    }

    /// Fraction of allocations that recycled a freed block, in `[0, 1]`.
    ///
    /// Zero when nothing has been allocated yet.
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.allocations();
        if total == 0 {
            return 0.0;
        }
        (self.bucket_reuses + self.general_reuses) as f64 / total as f64
    }
}

/// Snapshot of free-chain occupancy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainReport {
    /// Number of free blocks in each bucket chain, indexed like
    /// [`BUCKET_SIZES`].
    pub bucket_blocks: [usize; BUCKET_COUNT],
    /// Number of free blocks in the general chain.
    pub general_blocks: usize,
    /// Payload bytes held by the general chain.
    pub general_bytes: u64,
    /// Bytes carved from the wilderness so far, headers included.
    pub heap_bytes: u32,
}

impl ChainReport {
    /// Payload bytes held by all bucket chains.
    pub fn bucket_bytes(&self) -> u64 {
        self.bucket_blocks
            .iter()
            .zip(BUCKET_SIZES)
            .map(|(&n, size)| n as u64 * u64::from(size))
            .sum()
    }

    /// Payload bytes sitting in any free chain.
    pub fn free_bytes(&self) -> u64 {
        self.bucket_bytes() + self.general_bytes
    }

    /// Total number of free blocks across all chains.
    pub fn free_blocks(&self) -> usize {
        self.bucket_blocks.iter().sum::<usize>() + self.general_blocks
    }
}
