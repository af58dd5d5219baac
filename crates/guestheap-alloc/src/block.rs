//! Header and forward-pointer access for blocks in linear memory.

use guestheap_core::{BlockAddr, LinearMemory, MIN_PAYLOAD};

/// Payload size recorded in a block's header.
pub fn size_of<M: LinearMemory + ?Sized>(mem: &M, block: BlockAddr) -> u32 {
    mem.read_u32(block.header())
}

/// Overwrite a block's header.
pub fn set_size<M: LinearMemory + ?Sized>(mem: &mut M, block: BlockAddr, size: u32) {
    mem.write_u32(block.header(), size);
}

/// Next block in the chain this (free) block belongs to.
pub fn next_of<M: LinearMemory + ?Sized>(mem: &M, block: BlockAddr) -> Option<BlockAddr> {
    BlockAddr::from_fd(mem.read_u32(block.fd_slot()))
}

/// Link a free block to its successor.
pub fn set_next<M: LinearMemory + ?Sized>(mem: &mut M, block: BlockAddr, next: Option<BlockAddr>) {
    mem.write_u32(block.fd_slot(), BlockAddr::to_fd(next));
}

/// Normalise a guest request to a payload size.
///
/// Rounds up to a multiple of 4, then floors at [`MIN_PAYLOAD`]. The
/// result is what size-class lookup and the block header see.
///
/// # Panics
///
/// Panics if rounding overflows `u32`; no such block could exist in a
/// 32-bit linear memory.
pub fn round_request(size: u32) -> u32 {
    let rounded = match size.checked_add(3) {
        Some(s) => s & !3,
        None => panic!("allocation of {size} bytes exceeds the 32-bit address space"),
    };
    rounded.max(MIN_PAYLOAD)
}
