//! Slices: a `{data, length}` record plus its backing storage.
//!
//! The guest represents a slice as a pointer to an 8-byte control block:
//!
//! ```text
//! handle ─► ┌──────────────────┬──────────────────┐
//!           │ data: u32 (LE)   │ length: u32 (LE) │
//!           └────────┬─────────┴──────────────────┘
//!                    ▼
//!           ┌──────────────────────────────────────┐
//!           │ length * element_size bytes          │
//!           └──────────────────────────────────────┘
//! ```
//!
//! Both blocks are ordinary heap blocks; the control block is always an
//! 8-byte bucket block.

use guestheap_core::LinearMemory;

use crate::heap::GuestHeap;

/// Size of the control block in bytes.
pub const ARRAY_RECORD_SIZE: u32 = 8;

/// Decoded contents of a slice control block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayRecord {
    /// Payload address of the content block.
    pub data: u32,
    /// Number of elements.
    pub length: u32,
}

impl ArrayRecord {
    /// Read the record behind a slice handle.
    pub fn read<M: LinearMemory + ?Sized>(mem: &M, handle: u32) -> Self {
        Self {
            data: mem.read_u32(handle),
            length: mem.read_u32(handle + 4),
        }
    }

    /// Write the record at a slice handle.
    pub fn write<M: LinearMemory + ?Sized>(&self, mem: &mut M, handle: u32) {
        mem.write_u32(handle, self.data);
        mem.write_u32(handle + 4, self.length);
    }
}

impl GuestHeap {
    /// Allocate a slice of `length` elements of `element_size` bytes.
    ///
    /// Allocates the control block first, then the content block, and
    /// returns the control block's payload address as the slice handle.
    ///
    /// # Panics
    ///
    /// Panics if `length * element_size` overflows `u32`, or on any
    /// wilderness fault (see [`GuestHeap::allocate`]).
    pub fn allocate_array<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        length: u32,
        element_size: u32,
    ) -> u32 {
        let bytes = match length.checked_mul(element_size) {
            Some(b) => b,
            None => panic!("slice of {length} x {element_size} bytes exceeds the address space"),
        };
        let handle = self.allocate(mem, ARRAY_RECORD_SIZE);
        let data = self.allocate(mem, bytes);
        ArrayRecord { data, length }.write(mem, handle);
        handle
    }

    /// Release a slice and its content block.
    ///
    /// The content block's size comes from its own header; `element_size`
    /// is accepted for symmetry with the guest import but not consulted.
    pub fn free_array<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        handle: u32,
        _element_size: u32,
    ) {
        let record = ArrayRecord::read(mem, handle);
        self.free(mem, record.data);
        self.free(mem, handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeapConfig;

    fn heap() -> (GuestHeap, Vec<u8>) {
        (GuestHeap::new(&HeapConfig::new(0)).unwrap(), vec![0u8; 4096])
    }

    #[test]
    fn record_points_at_content_block() {
        let (mut heap, mut mem) = heap();
        let handle = heap.allocate_array(&mut mem, 10, 4);
        let record = ArrayRecord::read(&mem, handle);
        assert_eq!(record.length, 10);
        assert_eq!(heap.block_size(&mem, record.data), 40);
        assert_eq!(heap.block_size(&mem, handle), ARRAY_RECORD_SIZE);
    }

    #[test]
    fn control_block_precedes_content_on_fresh_heap() {
        let (mut heap, mut mem) = heap();
        let handle = heap.allocate_array(&mut mem, 3, 2);
        let record = ArrayRecord::read(&mem, handle);
        assert_eq!(handle, 4);
        assert_eq!(record.data, handle + ARRAY_RECORD_SIZE + 4);
        // 3 * 2 = 6 bytes, rounded to 8.
        assert_eq!(heap.block_size(&mem, record.data), 8);
    }

    #[test]
    fn empty_slice_still_gets_a_content_block() {
        let (mut heap, mut mem) = heap();
        let handle = heap.allocate_array(&mut mem, 0, 16);
        let record = ArrayRecord::read(&mem, handle);
        assert_eq!(record.length, 0);
        assert_eq!(heap.block_size(&mem, record.data), 4);
    }

    #[test]
    fn free_then_allocate_reuses_both_blocks() {
        let (mut heap, mut mem) = heap();
        let first = heap.allocate_array(&mut mem, 10, 4);
        let first_data = ArrayRecord::read(&mem, first).data;
        heap.free_array(&mut mem, first, 4);

        let end = heap.heap_end();
        let second = heap.allocate_array(&mut mem, 10, 4);
        assert_eq!(second, first);
        assert_eq!(ArrayRecord::read(&mem, second).data, first_data);
        assert_eq!(heap.heap_end(), end);
    }

    #[test]
    fn free_ignores_element_size_argument() {
        let (mut heap, mut mem) = heap();
        let handle = heap.allocate_array(&mut mem, 25, 4);
        let data = ArrayRecord::read(&mem, handle).data;
        heap.free_array(&mut mem, handle, 999);
        // Content (100 bytes) went to the general chain by its header size.
        assert_eq!(heap.general_head().map(|b| b.payload()), Some(data));
        assert_eq!(heap.bucket_head(1).map(|b| b.payload()), Some(handle));
    }

    #[test]
    fn write_read_record() {
        let mut mem = vec![0u8; 16];
        let record = ArrayRecord { data: 0x40, length: 7 };
        record.write(&mut mem, 3);
        assert_eq!(ArrayRecord::read(&mem, 3), record);
    }

    #[test]
    #[should_panic(expected = "exceeds the address space")]
    fn oversized_slice_faults() {
        let (mut heap, mut mem) = heap();
        heap.allocate_array(&mut mem, u32::MAX, 2);
    }
}
