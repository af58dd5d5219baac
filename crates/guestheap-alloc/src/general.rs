//! First-fit free chain for every size the buckets don't serve.
//!
//! The chain is kept in free order (most recently freed first), not size
//! order, and the search takes the first block that is large enough. A
//! block with enough slack is split: the low part goes to the caller and
//! the high part becomes a new free block.
//!
//! ```text
//! before:  │hdr=free_size│ ............ free_size bytes ............ │
//! after:   │hdr=size│ size bytes │hdr=leftover-4│ leftover-4 bytes  │
//!          └── returned block ───┘└──────── remainder ─────────────┘
//! ```

use guestheap_core::{BlockAddr, LinearMemory, HEADER_SIZE, MIN_PAYLOAD};

use crate::block;

/// Minimum slack (free size minus request) for a split.
///
/// The remainder needs a header and a minimum payload; anything below one
/// extra word on top of that is handed out with the block instead.
pub const SPLIT_THRESHOLD: u32 = HEADER_SIZE + MIN_PAYLOAD + 4;

/// Outcome of a successful first-fit search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fit {
    /// The matched block is handed out whole; its header keeps the
    /// original (possibly larger) size.
    Whole(BlockAddr),
    /// The matched block was split. `block` now has exactly the requested
    /// size; `remainder` is a headed but unlinked free block the caller
    /// must route to a chain.
    Split {
        /// The low, allocated part.
        block: BlockAddr,
        /// The high, free part.
        remainder: BlockAddr,
    },
}

impl Fit {
    /// The block handed to the caller.
    pub fn block(&self) -> BlockAddr {
        match *self {
            Fit::Whole(block) | Fit::Split { block, .. } => block,
        }
    }
}

/// Head of the general free chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneralChain {
    head: Option<BlockAddr>,
}

impl GeneralChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a freed block onto the chain head.
    pub fn push<M: LinearMemory + ?Sized>(&mut self, mem: &mut M, block: BlockAddr) {
        block::set_next(mem, block, self.head);
        self.head = Some(block);
    }

    /// Find, unlink and (maybe) split the first block with at least `size`
    /// payload bytes. `size` must already be rounded.
    ///
    /// Returns `None` if no block in the chain is large enough.
    pub fn take_first_fit<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        size: u32,
    ) -> Option<Fit> {
        let mut prev = None;
        let mut cursor = self.head;

        while let Some(candidate) = cursor {
            let free_size = block::size_of(mem, candidate);
            let next = block::next_of(mem, candidate);

            if free_size < size {
                prev = Some(candidate);
                cursor = next;
                continue;
            }

            self.unlink(mem, prev, next);

            let leftover = free_size - size;
            if leftover < SPLIT_THRESHOLD {
                return Some(Fit::Whole(candidate));
            }

            let remainder = BlockAddr(candidate.payload() + size);
            block::set_size(mem, candidate, size);
            block::set_size(mem, remainder, leftover - HEADER_SIZE);
            tracing::trace!(
                block = candidate.0,
                size,
                remainder = remainder.0,
                remainder_size = leftover - HEADER_SIZE,
                "split free block"
            );
            return Some(Fit::Split {
                block: candidate,
                remainder,
            });
        }

        None
    }

    /// Current head of the chain.
    pub fn head(&self) -> Option<BlockAddr> {
        self.head
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    // A -> [B] -> C becomes A -> C
    fn unlink<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        prev: Option<BlockAddr>,
        next: Option<BlockAddr>,
    ) {
        match prev {
            Some(p) => block::set_next(mem, p, next),
            None => self.head = next,
        }
    }
}
