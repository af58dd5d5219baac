//! Heap configuration parameters.

use guestheap_core::ConfigError;

/// Configuration for a [`GuestHeap`](crate::GuestHeap).
///
/// Built once per guest-module instance from the offset the guest exports
/// as the first byte past its static data. Validated at construction; all
/// values are immutable after creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapConfig {
    /// Requested heap start, as exported by the guest.
    ///
    /// Rounded by [`align_heap_start`] before use.
    pub heap_start: u32,
}

impl HeapConfig {
    /// Create a config for the given (unrounded) heap start.
    pub fn new(heap_start: u32) -> Self {
        Self { heap_start }
    }

    /// The heap start after alignment rounding.
    ///
    /// Returns [`ConfigError::HeapStartOverflow`] if rounding would leave
    /// the 32-bit address space.
    pub fn aligned_start(&self) -> Result<u32, ConfigError> {
        align_heap_start(self.heap_start).ok_or(ConfigError::HeapStartOverflow {
            heap_start: self.heap_start,
        })
    }

    /// Check the config against a linear memory of `memory_size` bytes.
    ///
    /// The heap may start exactly at the end of memory (an empty heap whose
    /// first allocation faults until the owner grows the buffer), but not
    /// past it.
    pub fn validate(&self, memory_size: usize) -> Result<(), ConfigError> {
        let start = self.aligned_start()?;
        if start as usize > memory_size {
            return Err(ConfigError::HeapStartOutOfBounds {
                heap_start: start,
                memory_size,
            });
        }
        Ok(())
    }
}

/// Round a requested heap start to its 8-byte boundary.
///
/// A start that is already a multiple of 8 is kept. Otherwise the result is
/// `start + 16 - (start % 8)`, which skips one extra 8-byte slot past the
/// next boundary: `3 -> 16`, `9 -> 24`.
///
/// Returns `None` on 32-bit overflow.
pub fn align_heap_start(start: u32) -> Option<u32> {
    let rem = start % 8;
    if rem == 0 {
        Some(start)
    } else {
        start.checked_add(16 - rem)
    }
}
