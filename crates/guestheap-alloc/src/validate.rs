//! Opt-in bookkeeping of live allocations.
//!
//! The heap trusts its caller. [`LiveSet`] sits beside a heap (never inside
//! it) and remembers which payload addresses are currently handed out, so a
//! host can reject a bad free *before* it reaches the heap. A heap used
//! without a `LiveSet` behaves exactly as if this module did not exist.

use guestheap_core::ValidationError;
use indexmap::{IndexMap, IndexSet};

use crate::heap::GuestHeap;

/// Live payload addresses of one heap and the sizes their headers held
/// when they were handed out.
#[derive(Clone, Debug, Default)]
pub struct LiveSet {
    /// Payload address -> payload size, in allocation order.
    live: IndexMap<u32, u32>,
    /// Addresses that were live once and have been freed since.
    freed: IndexSet<u32>,
}

impl LiveSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block the heap just handed out.
    pub fn record_alloc(&mut self, addr: u32, size: u32) {
        self.freed.swap_remove(&addr);
        self.live.insert(addr, size);
    }

    /// Check that freeing `addr` is legal, without changing anything.
    ///
    /// `declared` is the size the guest passed with the free, if any; it
    /// may not exceed the block's recorded size. Returns the recorded size.
    pub fn check_free(
        &self,
        heap: &GuestHeap,
        addr: u32,
        declared: Option<u32>,
    ) -> Result<u32, ValidationError> {
        if !heap.contains(addr) {
            return Err(ValidationError::OutsideHeap {
                addr,
                heap_start: heap.heap_start(),
                heap_end: heap.heap_end(),
            });
        }
        let Some(&actual) = self.live.get(&addr) else {
            return Err(if self.freed.contains(&addr) {
                ValidationError::DoubleFree { addr }
            } else {
                ValidationError::UnknownAddress { addr }
            });
        };
        match declared {
            Some(declared) if declared > actual => Err(ValidationError::SizeMismatch {
                addr,
                declared,
                actual,
            }),
            _ => Ok(actual),
        }
    }

    /// Record that `addr` was freed.
    pub fn record_free(&mut self, addr: u32) {
        if self.live.swap_remove(&addr).is_some() {
            self.freed.insert(addr);
        }
    }

    /// Whether `addr` is currently handed out.
    pub fn is_live(&self, addr: u32) -> bool {
        self.live.contains_key(&addr)
    }

    /// Number of live allocations.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Payload bytes held by live allocations.
    pub fn live_bytes(&self) -> u64 {
        self.live.values().map(|&s| u64::from(s)).sum()
    }

    /// Live `(address, size)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.live.iter().map(|(&a, &s)| (a, s))
    }
}
