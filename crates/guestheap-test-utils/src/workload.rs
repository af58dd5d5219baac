//! Scripted allocate/free sequences.
//!
//! A [`Workload`] is a list of [`Op`]s replayed against a heap. Frees
//! name a live allocation by index, modulo the number currently live,
//! so any op sequence is valid: there is no way to script a double free
//! or a foreign address.

use guestheap_alloc::GuestHeap;
use guestheap_core::LinearMemory;
use proptest::prelude::*;

/// One scripted step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate this many bytes.
    Alloc(u32),
    /// Free the live allocation at this index (modulo live count).
    /// A no-op when nothing is live.
    Free(usize),
}

/// What replaying a workload left behind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkloadOutcome {
    /// `(payload address, requested size)` of every still-live block.
    pub live: Vec<(u32, u32)>,
    /// Highest heap end seen.
    pub peak_heap_end: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Workload {
    pub ops: Vec<Op>,
}

impl Workload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ops(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn alloc(mut self, size: u32) -> Self {
        self.ops.push(Op::Alloc(size));
        self
    }

    pub fn free(mut self, index: usize) -> Self {
        self.ops.push(Op::Free(index));
        self
    }

    /// Allocate then free every bucket size, `rounds` times.
    pub fn bucket_churn(rounds: usize) -> Self {
        let mut w = Self::new();
        for _ in 0..rounds {
            for size in (4..=32).step_by(4) {
                w = w.alloc(size).free(0);
            }
        }
        w
    }

    /// Interleaved bucket and general requests with out-of-order frees.
    ///
    /// Deterministic: sizes walk a fixed stride through `1..=256`, and
    /// every third op frees an older block.
    pub fn mixed(len: usize) -> Self {
        let mut w = Self::new();
        let mut size = 1u32;
        for i in 0..len {
            if i % 3 == 2 {
                w = w.free(i / 2);
            } else {
                w = w.alloc(size);
                size = (size + 37) % 256 + 1;
            }
        }
        w
    }

    /// Replay against `heap`.
    ///
    /// Panics (through the heap) if memory runs out.
    pub fn run<M: LinearMemory + ?Sized>(&self, heap: &mut GuestHeap, mem: &mut M) -> WorkloadOutcome {
        let mut outcome = WorkloadOutcome {
            live: Vec::new(),
            peak_heap_end: heap.heap_end(),
        };
        for op in &self.ops {
            match *op {
                Op::Alloc(size) => {
                    let addr = heap.allocate(mem, size);
                    outcome.live.push((addr, size));
                    outcome.peak_heap_end = outcome.peak_heap_end.max(heap.heap_end());
                }
                Op::Free(index) => {
                    if outcome.live.is_empty() {
                        continue;
                    }
                    let (addr, _) = outcome.live.swap_remove(index % outcome.live.len());
                    heap.free(mem, addr);
                }
            }
        }
        outcome
    }
}

/// Arbitrary ops with request sizes in `0..=max_size`.
///
/// Allocations are weighted 3:2 over frees so random workloads grow.
pub fn op_strategy(max_size: u32) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..=max_size).prop_map(Op::Alloc),
        2 => any::<usize>().prop_map(Op::Free),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestHeap;

    #[test]
    fn free_with_nothing_live_is_skipped() {
        let mut t = TestHeap::page();
        let outcome = Workload::new().free(3).alloc(8).run(&mut t.heap, &mut t.mem);
        assert_eq!(outcome.live, vec![(4, 8)]);
    }

    #[test]
    fn bucket_churn_recycles_one_block_per_size() {
        let mut t = TestHeap::page();
        let outcome = Workload::bucket_churn(10).run(&mut t.heap, &mut t.mem);
        assert!(outcome.live.is_empty());
        // One block per bucket size, each header + payload, carved once.
        let carved: u32 = (4..=32).step_by(4).map(|s| s + 4).sum();
        assert_eq!(outcome.peak_heap_end, carved);
        assert_eq!(t.heap.stats().wilderness_allocs, 8);
    }

    #[test]
    fn mixed_is_deterministic() {
        assert_eq!(Workload::mixed(30), Workload::mixed(30));
        assert!(Workload::mixed(30)
            .ops
            .iter()
            .any(|op| matches!(op, Op::Free(_))));
    }
}
