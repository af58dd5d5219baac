//! guestheap: a host-managed heap for sandboxed guests without an allocator.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the guestheap sub-crates. For most hosts, adding `guestheap` as a single
//! dependency is sufficient; C hosts link `guestheap-ffi` instead.
//!
//! # Quick start
//!
//! ```rust
//! use guestheap::prelude::*;
//!
//! // The guest's linear memory; its static data ends at byte 100.
//! // The heap start is rounded up as `align_heap_start` describes.
//! let mut mem = vec![0u8; 64 * 1024];
//! let config = ContextConfig::new(100);
//! let mut ctx = HostContext::attach(&config, &mem).unwrap();
//! assert_eq!(ctx.heap().heap_start(), 112);
//!
//! // core.new_object(12): a 12-byte block right after the first header.
//! let a = ctx.new_object(&mut mem, 12);
//! assert_eq!(a, 116);
//! assert_eq!(mem.read_u32(a - 4), 12);
//!
//! // Freed blocks of a bucket size are reused last-in, first-out.
//! ctx.drop_object(&mut mem, a, 12).unwrap();
//! assert_eq!(ctx.new_object(&mut mem, 12), a);
//!
//! // core.new_slice(10, 4): a {data, length} record plus 40 content bytes.
//! let handle = ctx.new_slice(&mut mem, 10, 4);
//! let record = ArrayRecord::read(&mem, handle);
//! assert_eq!(record.length, 10);
//! assert_eq!(mem.read_u32(record.data - 4), 40);
//!
//! // Runtimes that route every import through one trampoline use `call`.
//! let b = ctx.call(&mut mem, "new_object", &[200]).unwrap();
//! assert!(b.is_some());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `guestheap-core` | Block addresses, linear memory access, errors |
//! | [`heap`] | `guestheap-alloc` | The heap, its chains, statistics, validation |
//! | [`host`] | `guestheap-host` | Per-instance context and the `core` imports |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Block layout, linear memory access and error types (`guestheap-core`).
pub use guestheap_core as types;

/// The allocator itself (`guestheap-alloc`).
///
/// [`heap::GuestHeap`] composes the bucket chains, the general chain and
/// the wilderness. [`heap::LiveSet`] is the opt-in bookkeeping behind
/// validation.
pub use guestheap_alloc as heap;

/// Host context and import dispatch (`guestheap-host`).
///
/// [`host::HostContext`] is what a runtime keeps per guest instance.
pub use guestheap_host as host;

/// Common imports for typical guestheap usage.
///
/// ```rust
/// use guestheap::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use guestheap_core::{BlockAddr, LinearMemory};

    // Errors
    pub use guestheap_core::{ConfigError, ValidationError};
    pub use guestheap_host::ImportError;

    // Allocator
    pub use guestheap_alloc::{ArrayRecord, GuestHeap, HeapConfig, HeapStats};

    // Host
    pub use guestheap_host::{ContextConfig, HostContext, ImportFn, Validation};
}
