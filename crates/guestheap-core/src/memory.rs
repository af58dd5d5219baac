//! Byte-level access to the guest's linear memory.
//!
//! Block payloads are not guaranteed to be 4-byte aligned relative to the
//! buffer origin, so every word access goes through byte-wise
//! little-endian conversion rather than a `u32` view of the buffer.

/// A contiguous byte buffer addressed by 32-bit offsets.
///
/// The allocator never owns linear memory: the host runtime does, and
/// hands a reference in for the duration of each call. Only
/// [`as_bytes`](LinearMemory::as_bytes) and
/// [`as_bytes_mut`](LinearMemory::as_bytes_mut) need implementing.
///
/// There is no bounds checking beyond what the buffer enforces: an access
/// that runs off the end is a fatal fault and panics.
pub trait LinearMemory {
    /// The whole buffer, read-only.
    fn as_bytes(&self) -> &[u8];

    /// The whole buffer, writable.
    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Buffer length in bytes.
    fn size(&self) -> usize {
        self.as_bytes().len()
    }

    /// Read a little-endian `u32` at an arbitrary byte offset.
    ///
    /// # Panics
    ///
    /// Panics if `addr..addr + 4` is outside the buffer.
    fn read_u32(&self, addr: u32) -> u32 {
        let bytes = self.as_bytes();
        match word_range(addr).and_then(|r| bytes.get(r)) {
            Some(w) => u32::from_le_bytes([w[0], w[1], w[2], w[3]]),
            None => out_of_bounds(addr, bytes.len()),
        }
    }

    /// Write a little-endian `u32` at an arbitrary byte offset.
    ///
    /// # Panics
    ///
    /// Panics if `addr..addr + 4` is outside the buffer.
    fn write_u32(&mut self, addr: u32, value: u32) {
        let bytes = self.as_bytes_mut();
        let len = bytes.len();
        match word_range(addr).and_then(|r| bytes.get_mut(r)) {
            Some(w) => w.copy_from_slice(&value.to_le_bytes()),
            None => out_of_bounds(addr, len),
        }
    }
}

fn word_range(addr: u32) -> Option<std::ops::Range<usize>> {
    let start = usize::try_from(addr).ok()?;
    Some(start..start.checked_add(4)?)
}

#[cold]
fn out_of_bounds(addr: u32, len: usize) -> ! {
    panic!("linear memory access at {addr:#x} is out of bounds (memory is {len} bytes)")
}

impl LinearMemory for [u8] {
    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

impl LinearMemory for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

impl<T: LinearMemory + ?Sized> LinearMemory for &mut T {
    fn as_bytes(&self) -> &[u8] {
        (**self).as_bytes()
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        (**self).as_bytes_mut()
    }
}
