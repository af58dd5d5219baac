//! Reference workloads for benchmarking guestheap.
//!
//! Provides pre-built [`Workload`] profiles shaped like a real guest:
//!
//! - [`reference_profile`]: mostly small objects, a few mid-sized
//!   buffers, frees interleaved with allocation
//! - [`stress_profile`]: the same mix at 10x the length
//! - [`object_sizes`]: deterministic request sizes via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use guestheap_test_utils::{Op, Workload};

/// Linear memory large enough for [`stress_profile`] at any seed.
pub const PROFILE_MEMORY: usize = 16 * 1024 * 1024;

/// Build the reference workload: 10K ops.
///
/// Roughly two allocations per free, so the heap grows slowly while
/// both bucket and general chains see steady traffic.
pub fn reference_profile(seed: u64) -> Workload {
    profile(10_000, seed)
}

/// Build the stress workload: 100K ops.
pub fn stress_profile(seed: u64) -> Workload {
    profile(100_000, seed)
}

fn profile(len: usize, seed: u64) -> Workload {
    let sizes = object_sizes(len, seed);
    let ops = sizes
        .into_iter()
        .enumerate()
        .map(|(i, size)| {
            if i % 3 == 2 {
                Op::Free((size as usize).wrapping_mul(31) ^ i)
            } else {
                Op::Alloc(size)
            }
        })
        .collect();
    Workload::from_ops(ops)
}

/// Generate `n` deterministic request sizes.
///
/// 80% land in the bucket range (1..=32), the rest between 33 and 512,
/// which is the shape of a typical guest: many small records and the
/// odd string or buffer.
pub fn object_sizes(n: usize, seed: u64) -> Vec<u32> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let r = (state >> 33) as u32;
            if r % 5 == 0 {
                33 + r % 480
            } else {
                1 + r % 32
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestheap_alloc::{GuestHeap, HeapConfig};

    #[test]
    fn stress_profile_is_ten_times_reference() {
        assert_eq!(stress_profile(1).ops.len(), 10 * reference_profile(1).ops.len());
    }

    #[test]
    fn sizes_are_deterministic() {
        assert_eq!(object_sizes(100, 7), object_sizes(100, 7));
        assert_ne!(object_sizes(100, 7), object_sizes(100, 8));
    }

    #[test]
    fn sizes_are_mostly_bucket_sized() {
        let sizes = object_sizes(10_000, 42);
        let small = sizes.iter().filter(|&&s| s <= 32).count();
        assert!(small > 7_000, "only {small} bucket-sized requests");
        assert!(sizes.iter().all(|&s| (1..=512).contains(&s)));
    }

    #[test]
    fn reference_profile_recycles_blocks() {
        let mut mem = vec![0u8; PROFILE_MEMORY];
        let mut heap = GuestHeap::new(&HeapConfig::default()).unwrap();
        let outcome = reference_profile(42).run(&mut heap, &mut mem);
        assert!((outcome.peak_heap_end as usize) < PROFILE_MEMORY);
        assert!(heap.stats().reuse_ratio() > 0.0);
    }
}
