//! The guest heap: buckets, general chain and wilderness composed.
//!
//! [`GuestHeap`] is the one stateful type of the allocator. It owns no
//! memory; every operation borrows the guest's linear memory for its
//! duration. All chain state besides the heads lives inside that memory.
//!
//! ```text
//! allocate(size)
//! ├── round to a multiple of 4, floor at 4
//! ├── bucket size? ── pop bucket ── miss ──┐
//! └── otherwise ──── first fit ──── miss ──┴── wilderness
//!                    └── split? remainder → free routing
//!
//! free(addr)
//! └── read header ── bucket size? ── push bucket
//!                    └── otherwise ── push general
//! ```

use guestheap_core::{BlockAddr, ConfigError, LinearMemory};

use crate::block;
use crate::bucket::{bucket_index, BucketTable, BUCKET_COUNT};
use crate::chain::ChainIter;
use crate::config::HeapConfig;
use crate::general::{Fit, GeneralChain};
use crate::stats::{ChainReport, HeapStats};
use crate::wilderness::Wilderness;

/// Segregated free-list allocator over one guest's linear memory.
///
/// Construct one per guest-module instance. Mutation requires `&mut self`,
/// so a heap has exactly one writer; it is never shared between buffers.
#[derive(Clone, Debug)]
pub struct GuestHeap {
    wilderness: Wilderness,
    buckets: BucketTable,
    general: GeneralChain,
    stats: HeapStats,
}

impl GuestHeap {
    /// Create an empty heap starting at the config's aligned heap start.
    ///
    /// Returns `Err(ConfigError)` if aligning the start overflows.
    pub fn new(config: &HeapConfig) -> Result<Self, ConfigError> {
        let start = config.aligned_start()?;
        tracing::debug!(
            requested = config.heap_start,
            heap_start = start,
            "guest heap created"
        );
        Ok(Self {
            wilderness: Wilderness::new(start),
            buckets: BucketTable::new(),
            general: GeneralChain::new(),
            stats: HeapStats::default(),
        })
    }

    /// Create a heap and check that its start fits in `mem`.
    pub fn attach<M: LinearMemory + ?Sized>(
        config: &HeapConfig,
        mem: &M,
    ) -> Result<Self, ConfigError> {
        config.validate(mem.size())?;
        Self::new(config)
    }

    /// Allocate a block with at least `size` payload bytes.
    ///
    /// Returns the payload address. The request is rounded up to a
    /// multiple of 4 (minimum 4). Bucket sizes are served from their
    /// bucket, everything else from the general chain, and either falls
    /// back to the wilderness.
    ///
    /// # Panics
    ///
    /// Panics if the wilderness must grow past the end of `mem` or the
    /// 32-bit address space.
    pub fn allocate<M: LinearMemory + ?Sized>(&mut self, mem: &mut M, size: u32) -> u32 {
        let size = block::round_request(size);
        let block = match bucket_index(size) {
            Some(index) => self.allocate_bucket(mem, index, size),
            None => self.allocate_general(mem, size),
        };
        block.payload()
    }

    /// Release the block whose payload starts at `addr`.
    ///
    /// The block's size is re-read from its header and decides which
    /// chain it joins. Freeing an address that is not a live allocation
    /// corrupts the heap silently.
    pub fn free<M: LinearMemory + ?Sized>(&mut self, mem: &mut M, addr: u32) {
        self.release(mem, BlockAddr::from_payload(addr));
    }

    fn allocate_bucket<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        index: usize,
        size: u32,
    ) -> BlockAddr {
        match self.buckets.pop(mem, index) {
            Some(block) => {
                self.stats.bucket_reuses += 1;
                block
            }
            None => self.grow(mem, size),
        }
    }

    fn allocate_general<M: LinearMemory + ?Sized>(&mut self, mem: &mut M, size: u32) -> BlockAddr {
        match self.general.take_first_fit(mem, size) {
            Some(Fit::Whole(block)) => {
                self.stats.general_reuses += 1;
                block
            }
            Some(Fit::Split { block, remainder }) => {
                self.stats.general_reuses += 1;
                self.stats.splits += 1;
                self.release(mem, remainder);
                block
            }
            None => self.grow(mem, size),
        }
    }

    fn grow<M: LinearMemory + ?Sized>(&mut self, mem: &mut M, size: u32) -> BlockAddr {
        let block = self.wilderness.allocate(mem, size);
        self.stats.wilderness_allocs += 1;
        block
    }

    fn release<M: LinearMemory + ?Sized>(&mut self, mem: &mut M, block: BlockAddr) {
        let size = block::size_of(mem, block);
        match bucket_index(size) {
            Some(index) => {
                self.buckets.push(mem, index, block);
                self.stats.bucket_frees += 1;
            }
            None => {
                self.general.push(mem, block);
                self.stats.general_frees += 1;
            }
        }
        tracing::trace!(block = block.0, size, "block freed");
    }

    /// First byte of the heap (after alignment).
    pub fn heap_start(&self) -> u32 {
        self.wilderness.start()
    }

    /// Current end of the heap (exclusive). Never decreases.
    pub fn heap_end(&self) -> u32 {
        self.wilderness.end()
    }

    /// Whether a payload address falls inside the carved heap region.
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.heap_start() + guestheap_core::HEADER_SIZE && addr < self.heap_end()
    }

    /// Payload size recorded in the header of the block at `addr`.
    ///
    /// This may exceed what was requested when a block was handed out
    /// whole from the general chain.
    pub fn block_size<M: LinearMemory + ?Sized>(&self, mem: &M, addr: u32) -> u32 {
        block::size_of(mem, BlockAddr::from_payload(addr))
    }

    /// Running allocation counters.
    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Head of bucket chain `index` (see [`BUCKET_SIZES`](crate::BUCKET_SIZES)).
    pub fn bucket_head(&self, index: usize) -> Option<BlockAddr> {
        self.buckets.head(index)
    }

    /// Head of the general chain.
    pub fn general_head(&self) -> Option<BlockAddr> {
        self.general.head()
    }

    /// Blocks in bucket chain `index`, head first.
    pub fn bucket_chain<'m, M: LinearMemory + ?Sized>(
        &self,
        mem: &'m M,
        index: usize,
    ) -> ChainIter<'m, M> {
        ChainIter::new(mem, self.buckets.head(index))
    }

    /// Blocks in the general chain, head first.
    pub fn general_chain<'m, M: LinearMemory + ?Sized>(&self, mem: &'m M) -> ChainIter<'m, M> {
        ChainIter::new(mem, self.general.head())
    }

    /// Walk every free chain and summarise its contents.
    pub fn chain_report<M: LinearMemory + ?Sized>(&self, mem: &M) -> ChainReport {
        let mut report = ChainReport {
            heap_bytes: self.wilderness.used(),
            ..ChainReport::default()
        };
        for index in 0..BUCKET_COUNT {
            report.bucket_blocks[index] = self.bucket_chain(mem, index).count();
        }
        for block in self.general_chain(mem) {
            report.general_blocks += 1;
            report.general_bytes += u64::from(block::size_of(mem, block));
        }
        report
    }
}
