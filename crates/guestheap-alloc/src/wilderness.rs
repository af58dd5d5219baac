//! The wilderness: bump allocation from the unused tail of the heap.
//!
//! Every block in the heap was born here. Free chains only ever recycle
//! blocks the wilderness already carved; [`Wilderness::allocate`] is the
//! one place `heap_end` moves.

use guestheap_core::{BlockAddr, LinearMemory, HEADER_SIZE};

use crate::block;

/// Bounds of the heap region `[start, end)`.
///
/// `end` is monotonically non-decreasing. The region is never shrunk;
/// freed blocks go to chains, not back to the wilderness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wilderness {
    /// First byte of the heap (already aligned).
    start: u32,
    /// One past the last byte of the last block ever carved.
    end: u32,
}

impl Wilderness {
    /// Create an empty heap region starting at an already-aligned offset.
    pub fn new(start: u32) -> Self {
        Self { start, end: start }
    }

    /// Carve a new block with a `size`-byte payload from the wilderness.
    ///
    /// Writes the header at the current end, advances the end by
    /// `HEADER_SIZE + size` and returns the new block. `size` must already
    /// be rounded.
    ///
    /// # Panics
    ///
    /// Panics if the block does not fit in linear memory or would cross
    /// the 32-bit address space. Growing the buffer is the owner's job.
    pub fn allocate<M: LinearMemory + ?Sized>(&mut self, mem: &mut M, size: u32) -> BlockAddr {
        let block = BlockAddr(self.end);
        let new_end = match HEADER_SIZE
            .checked_add(size)
            .and_then(|total| self.end.checked_add(total))
        {
            Some(end) => end,
            None => panic!(
                "wilderness exhausted: {size}-byte block at {:#x} overflows the address space",
                self.end
            ),
        };
        if usize::try_from(new_end).map_or(true, |end| end > mem.size()) {
            panic!(
                "wilderness exhausted: {size}-byte block at {:#x} is out of bounds (memory is {} bytes)",
                self.end,
                mem.size()
            );
        }
        block::set_size(mem, block, size);
        self.end = new_end;
        tracing::trace!(block = block.0, size, heap_end = new_end, "wilderness grown");
        block
    }

    /// First byte of the heap.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Current end of the heap (exclusive).
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Bytes carved so far, headers included.
    pub fn used(&self) -> u32 {
        self.end - self.start
    }

    /// Whether `block` was carved by this wilderness (by address only).
    pub fn contains(&self, block: BlockAddr) -> bool {
        block.0 >= self.start && block.0 < self.end
    }
}
