//! Heap and memory fixtures.
//!
//! - [`TestHeap`]: a heap plus a zeroed buffer, with shorthand for the
//!   common allocate/free/inspect steps.
//! - [`CountingMemory`]: a [`LinearMemory`] that counts word reads and
//!   writes, for asserting how much memory traffic an operation costs.

use std::cell::Cell;

use guestheap_alloc::{ArrayRecord, GuestHeap, HeapConfig};
use guestheap_core::{BlockAddr, LinearMemory};

/// One WebAssembly page.
pub const PAGE_SIZE: usize = 64 * 1024;

/// A heap with its own linear memory.
pub struct TestHeap {
    pub heap: GuestHeap,
    pub mem: Vec<u8>,
}

impl TestHeap {
    /// Heap at `heap_start` over `memory_size` zeroed bytes.
    ///
    /// Panics if the configuration is rejected.
    pub fn new(heap_start: u32, memory_size: usize) -> Self {
        let mem = vec![0u8; memory_size];
        let heap = GuestHeap::attach(&HeapConfig::new(heap_start), &mem)
            .unwrap_or_else(|e| panic!("test heap config rejected: {e}"));
        Self { heap, mem }
    }

    /// Heap at address 0 over one page.
    pub fn page() -> Self {
        Self::new(0, PAGE_SIZE)
    }

    pub fn alloc(&mut self, size: u32) -> u32 {
        self.heap.allocate(&mut self.mem, size)
    }

    pub fn free(&mut self, addr: u32) {
        self.heap.free(&mut self.mem, addr);
    }

    pub fn alloc_array(&mut self, length: u32, element_size: u32) -> u32 {
        self.heap.allocate_array(&mut self.mem, length, element_size)
    }

    pub fn free_array(&mut self, handle: u32, element_size: u32) {
        self.heap.free_array(&mut self.mem, handle, element_size);
    }

    /// Payload size recorded in the header of the block at `addr`.
    pub fn header(&self, addr: u32) -> u32 {
        self.heap.block_size(&self.mem, addr)
    }

    /// The slice record behind `handle`.
    pub fn record(&self, handle: u32) -> ArrayRecord {
        ArrayRecord::read(&self.mem, handle)
    }

    /// Payload addresses in bucket `index`, head first.
    pub fn bucket(&self, index: usize) -> Vec<u32> {
        self.heap
            .bucket_chain(&self.mem, index)
            .map(BlockAddr::payload)
            .collect()
    }

    /// Payload addresses in the general chain, head first.
    pub fn general(&self) -> Vec<u32> {
        self.heap
            .general_chain(&self.mem)
            .map(BlockAddr::payload)
            .collect()
    }
}

impl Default for TestHeap {
    fn default() -> Self {
        Self::page()
    }
}

/// Linear memory that counts 32-bit word accesses.
///
/// Byte-level access through `as_bytes`/`as_bytes_mut` is not counted.
pub struct CountingMemory {
    bytes: Vec<u8>,
    reads: Cell<u64>,
    writes: u64,
}

impl CountingMemory {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size],
            reads: Cell::new(0),
            writes: 0,
        }
    }

    /// Word reads since creation or the last [`reset`](Self::reset).
    pub fn reads(&self) -> u64 {
        self.reads.get()
    }

    /// Word writes since creation or the last [`reset`](Self::reset).
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn reset(&mut self) {
        self.reads.set(0);
        self.writes = 0;
    }
}

impl LinearMemory for CountingMemory {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    fn read_u32(&self, addr: u32) -> u32 {
        self.reads.set(self.reads.get() + 1);
        self.bytes.as_slice().read_u32(addr)
    }

    fn write_u32(&mut self, addr: u32, value: u32) {
        self.writes += 1;
        self.bytes.as_mut_slice().write_u32(addr, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_fixture_starts_empty() {
        let t = TestHeap::page();
        assert_eq!(t.mem.len(), PAGE_SIZE);
        assert_eq!(t.heap.heap_end(), 0);
        assert!(t.general().is_empty());
    }

    #[test]
    fn fixture_shorthand_drives_the_heap() {
        let mut t = TestHeap::default();
        let a = t.alloc(8);
        assert_eq!(t.header(a), 8);
        t.free(a);
        assert_eq!(t.bucket(1), vec![a]);
    }

    #[test]
    fn counting_memory_counts_words() {
        let mut mem = CountingMemory::new(64);
        mem.write_u32(0, 7);
        assert_eq!(mem.read_u32(0), 7);
        assert_eq!((mem.reads(), mem.writes()), (1, 1));
        mem.reset();
        assert_eq!((mem.reads(), mem.writes()), (0, 0));
    }
}
