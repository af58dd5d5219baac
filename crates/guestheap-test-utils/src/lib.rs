//! Test utilities for guestheap development.
//!
//! Provides a [`TestHeap`] fixture pairing a heap with its own linear
//! memory, a [`CountingMemory`] that records word traffic, scripted
//! [`Workload`]s with a matching proptest strategy, and
//! [`init_tracing`] for seeing allocator events in test output.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod workload;

pub use fixtures::{CountingMemory, TestHeap, PAGE_SIZE};
pub use workload::{op_strategy, Op, Workload, WorkloadOutcome};

/// Install a test-friendly `tracing` subscriber.
///
/// Filtered by `RUST_LOG` (nothing is printed when unset) and routed
/// through the test harness's captured output. Safe to call from every
/// test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
