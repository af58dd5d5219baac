//! Host side of the guestheap import contract.
//!
//! A guest module compiled without an allocator imports four functions
//! from the `core` namespace. This crate binds them to a
//! [`GuestHeap`](guestheap_alloc::GuestHeap) through a per-instance
//! [`HostContext`]:
//!
//! - Typed entry points ([`HostContext::new_object`] and friends) for
//!   runtimes that link imports individually.
//! - A name + `u32` argument dispatcher ([`HostContext::call`]) for
//!   runtimes that route every import through one trampoline.
//!
//! With [`Validation::Track`] the context rejects bad drops before they
//! reach the heap; otherwise it is a thin, trusting shim.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod error;
pub mod imports;
pub mod metrics;

pub use config::{ContextConfig, Validation};
pub use context::HostContext;
pub use error::ImportError;
pub use imports::{ImportArgs, ImportCall, ImportFn, IMPORT_MODULE};
pub use metrics::ImportMetrics;
