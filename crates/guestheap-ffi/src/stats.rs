//! C-compatible context statistics.

use guestheap_host::{HostContext, ImportFn};

/// Snapshot of one context's counters, filled by `guestheap_stats`.
///
/// All counters are cumulative since the context was created.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuestHeapStats {
    /// Allocations carved from the wilderness.
    pub wilderness_allocs: u64,
    /// Allocations served from a bucket chain.
    pub bucket_reuses: u64,
    /// Allocations served from the general chain.
    pub general_reuses: u64,
    /// General-chain hits that split the block.
    pub splits: u64,
    /// Blocks pushed onto a bucket chain.
    pub bucket_frees: u64,
    /// Blocks pushed onto the general chain.
    pub general_frees: u64,
    /// `new_object` calls.
    pub new_object_calls: u64,
    /// `drop_object` calls.
    pub drop_object_calls: u64,
    /// `new_slice` calls.
    pub new_slice_calls: u64,
    /// `drop_slice` calls.
    pub drop_slice_calls: u64,
    /// Calls refused by validation.
    pub rejected_calls: u64,
    /// First byte of the heap.
    pub heap_start: u32,
    /// One past the last byte carved from the wilderness.
    pub heap_end: u32,
}

impl From<&HostContext> for GuestHeapStats {
    fn from(ctx: &HostContext) -> Self {
        let heap = ctx.heap();
        let stats = heap.stats();
        let metrics = ctx.metrics();
        Self {
            wilderness_allocs: stats.wilderness_allocs,
            bucket_reuses: stats.bucket_reuses,
            general_reuses: stats.general_reuses,
            splits: stats.splits,
            bucket_frees: stats.bucket_frees,
            general_frees: stats.general_frees,
            new_object_calls: metrics.calls(ImportFn::NewObject),
            drop_object_calls: metrics.calls(ImportFn::DropObject),
            new_slice_calls: metrics.calls(ImportFn::NewSlice),
            drop_slice_calls: metrics.calls(ImportFn::DropSlice),
            rejected_calls: metrics.rejected,
            heap_start: heap.heap_start(),
            heap_end: heap.heap_end(),
        }
    }
}
