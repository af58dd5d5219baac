//! Block addresses and the on-buffer block layout.
//!
//! Every block in the guest heap is a 4-byte size header followed by the
//! payload:
//!
//! ```text
//!  BlockAddr            payload address (handed to the guest)
//!  │                    │
//!  ▼                    ▼
//!  ┌────────────────────┬──────────────────────────────────────┐
//!  │ size: u32 (LE)     │ payload: `size` bytes                │
//!  └────────────────────┴──────────────────────────────────────┘
//!                       └─ FD: u32 (LE), only while the block is free
//! ```
//!
//! Free chains link [`BlockAddr`]s (header addresses), not payload
//! addresses.

use std::fmt;

/// Size of the block header in bytes.
pub const HEADER_SIZE: u32 = 4;

/// Smallest payload a block may carry, so a freed block can always hold
/// its own forward pointer.
pub const MIN_PAYLOAD: u32 = 4;

/// Forward-pointer value marking the end of a free chain.
pub const FD_NONE: u32 = 0xFFFF_FFFF;

/// Byte address of a block header inside linear memory.
///
/// The guest never sees a `BlockAddr`; it only receives payload addresses
/// via [`BlockAddr::payload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockAddr(pub u32);

impl BlockAddr {
    /// Recover the block address from a payload address returned to the guest.
    ///
    /// # Panics
    ///
    /// Panics if `payload` is smaller than the header size, which can only
    /// happen for an address the allocator never handed out.
    pub fn from_payload(payload: u32) -> Self {
        match payload.checked_sub(HEADER_SIZE) {
            Some(addr) => Self(addr),
            None => panic!("payload address {payload:#x} lies below any block header"),
        }
    }

    /// Payload address for this block (header address + header size).
    pub fn payload(self) -> u32 {
        self.0 + HEADER_SIZE
    }

    /// Address of the size header.
    pub fn header(self) -> u32 {
        self.0
    }

    /// Address of the forward-pointer slot (first payload word).
    pub fn fd_slot(self) -> u32 {
        self.payload()
    }

    /// Decode a raw forward pointer into a chain link.
    pub fn from_fd(raw: u32) -> Option<Self> {
        if raw == FD_NONE {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Encode a chain link as a raw forward pointer.
    pub fn to_fd(link: Option<Self>) -> u32 {
        link.map_or(FD_NONE, |b| b.0)
    }
}

impl fmt::Display for BlockAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u32> for BlockAddr {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
