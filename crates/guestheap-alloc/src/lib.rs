//! Segregated free-list allocator for a guest module's linear memory.
//!
//! A sandboxed guest compiled without its own allocator asks the host for
//! memory through imports. This crate is the host side of that contract:
//! it carves and recycles blocks inside one contiguous byte buffer that the
//! guest cannot grow or inspect itself.
//!
//! # Architecture
//!
//! ```text
//! GuestHeap (one per guest instance)
//! ├── BucketTable   ── 8 LIFO chains for payloads 4, 8, ..., 32
//! ├── GeneralChain  ── one first-fit chain for all other sizes, with splitting
//! ├── Wilderness    ── bump pointer over the untouched heap tail
//! └── HeapStats     ── running counters
//! ```
//!
//! All chains are intrusive: a free block's forward pointer lives in its
//! own payload, so the heap's only out-of-buffer state is a handful of
//! chain heads and the heap bounds.
//!
//! # Size classes
//!
//! Requests are rounded up to a multiple of 4 (minimum 4). Which chain a
//! block belongs to is decided when it is *freed*, from the size in its
//! header, so a block split out of a general block may later be recycled
//! through a bucket.
//!
//! # Contract
//!
//! Trust-based, as with `malloc`/`free`: freeing a foreign address or the
//! same address twice corrupts the heap silently. Out-of-range memory
//! access panics. [`LiveSet`] offers opt-in checking for hosts that want it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod array;
pub mod block;
pub mod bucket;
pub mod chain;
pub mod config;
pub mod general;
pub mod heap;
pub mod stats;
pub mod validate;
pub mod wilderness;

pub use array::{ArrayRecord, ARRAY_RECORD_SIZE};
pub use bucket::{bucket_index, BUCKET_COUNT, BUCKET_SIZES};
pub use config::{align_heap_start, HeapConfig};
pub use general::SPLIT_THRESHOLD;
pub use heap::GuestHeap;
pub use stats::{ChainReport, HeapStats};
pub use validate::LiveSet;
