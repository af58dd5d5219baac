//! Read-only traversal of intrusive free chains.

use guestheap_core::{BlockAddr, LinearMemory};

use crate::block;

/// Iterator over the blocks of one free chain, head first.
///
/// Follows forward pointers stored in linear memory. A corrupted chain
/// (e.g. after a double free) may cycle; callers that walk untrusted
/// chains should bound the walk with [`Iterator::take`].
pub struct ChainIter<'m, M: LinearMemory + ?Sized> {
    mem: &'m M,
    cursor: Option<BlockAddr>,
}

impl<'m, M: LinearMemory + ?Sized> ChainIter<'m, M> {
    /// Walk the chain starting at `head`.
    pub fn new(mem: &'m M, head: Option<BlockAddr>) -> Self {
        Self { mem, cursor: head }
    }
}

impl<M: LinearMemory + ?Sized> Iterator for ChainIter<'_, M> {
    type Item = BlockAddr;

    fn next(&mut self) -> Option<BlockAddr> {
        let current = self.cursor?;
        self.cursor = block::next_of(self.mem, current);
        Some(current)
    }
}
