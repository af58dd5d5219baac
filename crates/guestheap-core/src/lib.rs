//! Core types for the guestheap allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the pieces every other crate in the workspace speaks in terms of:
//!
//! - [`BlockAddr`]: the header address of a heap block, plus the block
//!   layout constants (header size, minimum payload, chain sentinel).
//! - [`LinearMemory`]: unaligned little-endian 32-bit access over the
//!   guest's byte buffer.
//! - [`ConfigError`] and [`ValidationError`]: the only error values the
//!   workspace produces. The allocator itself is infallible; faults on
//!   out-of-range access panic.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod addr;
pub mod error;
pub mod memory;

pub use addr::{BlockAddr, FD_NONE, HEADER_SIZE, MIN_PAYLOAD};
pub use error::{ConfigError, ValidationError};
pub use memory::LinearMemory;
