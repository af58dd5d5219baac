//! Context lifecycle and the four allocator imports over the C ABI.
//!
//! Contexts live in a global handle table as `Arc<Mutex<HostContext>>`.
//! The table lock is held only long enough to clone the `Arc`, so calls
//! on different contexts never contend; calls on the same context are
//! serialized by its own mutex.

use std::sync::{Arc, Mutex};

use guestheap_host::{ContextConfig, HostContext, ImportError, Validation};

use crate::handle::HandleTable;
use crate::stats::GuestHeapStats;
use crate::status::GuestHeapStatus;

type ContextArc = Arc<Mutex<HostContext>>;

static CONTEXTS: Mutex<HandleTable<ContextArc>> = Mutex::new(HandleTable::new());

fn get_context(handle: u64) -> Option<ContextArc> {
    CONTEXTS.lock().ok()?.get(handle).cloned()
}

/// Borrow the guest's linear memory for one call.
///
/// # Safety
///
/// `mem` must point to `mem_len` initialized, writable bytes that nothing
/// else reads or writes until the returned slice is dropped.
#[allow(unsafe_code)]
unsafe fn guest_memory<'a>(mem: *mut u8, mem_len: usize) -> Option<&'a mut [u8]> {
    if mem.is_null() {
        return None;
    }
    // SAFETY: upheld by the caller.
    Some(unsafe { std::slice::from_raw_parts_mut(mem, mem_len) })
}

fn status_of(result: Result<(), ImportError>) -> i32 {
    match result {
        Ok(()) => GuestHeapStatus::Ok as i32,
        Err(e) => GuestHeapStatus::from(&e) as i32,
    }
}

// ── lifecycle ───────────────────────────────────────────────────

/// Create a context for a heap starting at `heap_start` (rounded up to
/// the heap alignment). A non-zero `validate` enables live-block
/// tracking.
///
/// Writes the new handle to `handle_out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_context_create(heap_start: u32, validate: u8, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if handle_out.is_null() {
            return GuestHeapStatus::InvalidArgument as i32;
        }
        let config = ContextConfig::new(heap_start).with_validation(Validation::from_flag(validate != 0));
        let ctx = match HostContext::new(&config) {
            Ok(ctx) => ctx,
            Err(e) => return GuestHeapStatus::from(&e) as i32,
        };
        let handle = ffi_lock!(CONTEXTS).insert(Arc::new(Mutex::new(ctx)));
        // SAFETY: handle_out is non-null and valid per caller contract.
        unsafe { *handle_out = handle };
        GuestHeapStatus::Ok as i32
    })
}

/// Destroy a context. Destroying twice returns `InvalidHandle`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_context_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(CONTEXTS).remove(handle) {
            Some(_) => GuestHeapStatus::Ok as i32,
            None => GuestHeapStatus::InvalidHandle as i32,
        }
    })
}

// ── imports ─────────────────────────────────────────────────────

/// `core.new_object`: allocate `size` bytes, writing the payload address
/// to `addr_out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_new_object(
    handle: u64,
    mem: *mut u8,
    mem_len: usize,
    size: u32,
    addr_out: *mut u32,
) -> i32 {
    ffi_guard!({
        if addr_out.is_null() {
            return GuestHeapStatus::InvalidArgument as i32;
        }
        let Some(ctx_arc) = get_context(handle) else {
            return GuestHeapStatus::InvalidHandle as i32;
        };
        // SAFETY: caller passes the instance's memory, exclusively, for this call.
        let Some(mem) = (unsafe { guest_memory(mem, mem_len) }) else {
            return GuestHeapStatus::InvalidArgument as i32;
        };
        let addr = ffi_lock!(ctx_arc).new_object(mem, size);
        // SAFETY: addr_out is non-null and valid per caller contract.
        unsafe { *addr_out = addr };
        GuestHeapStatus::Ok as i32
    })
}

/// `core.drop_object`: release the block at `addr`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_drop_object(
    handle: u64,
    mem: *mut u8,
    mem_len: usize,
    addr: u32,
    size: u32,
) -> i32 {
    ffi_guard!({
        let Some(ctx_arc) = get_context(handle) else {
            return GuestHeapStatus::InvalidHandle as i32;
        };
        // SAFETY: caller passes the instance's memory, exclusively, for this call.
        let Some(mem) = (unsafe { guest_memory(mem, mem_len) }) else {
            return GuestHeapStatus::InvalidArgument as i32;
        };
        let result = ffi_lock!(ctx_arc).drop_object(mem, addr, size);
        status_of(result)
    })
}

/// `core.new_slice`: allocate a slice record and `length * element_size`
/// content bytes, writing the record address to `addr_out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_new_slice(
    handle: u64,
    mem: *mut u8,
    mem_len: usize,
    length: u32,
    element_size: u32,
    addr_out: *mut u32,
) -> i32 {
    ffi_guard!({
        if addr_out.is_null() {
            return GuestHeapStatus::InvalidArgument as i32;
        }
        let Some(ctx_arc) = get_context(handle) else {
            return GuestHeapStatus::InvalidHandle as i32;
        };
        // SAFETY: caller passes the instance's memory, exclusively, for this call.
        let Some(mem) = (unsafe { guest_memory(mem, mem_len) }) else {
            return GuestHeapStatus::InvalidArgument as i32;
        };
        let addr = ffi_lock!(ctx_arc).new_slice(mem, length, element_size);
        // SAFETY: addr_out is non-null and valid per caller contract.
        unsafe { *addr_out = addr };
        GuestHeapStatus::Ok as i32
    })
}

/// `core.drop_slice`: release a slice record and its content block.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_drop_slice(
    handle: u64,
    mem: *mut u8,
    mem_len: usize,
    addr: u32,
    element_size: u32,
) -> i32 {
    ffi_guard!({
        let Some(ctx_arc) = get_context(handle) else {
            return GuestHeapStatus::InvalidHandle as i32;
        };
        // SAFETY: caller passes the instance's memory, exclusively, for this call.
        let Some(mem) = (unsafe { guest_memory(mem, mem_len) }) else {
            return GuestHeapStatus::InvalidArgument as i32;
        };
        let result = ffi_lock!(ctx_arc).drop_slice(mem, addr, element_size);
        status_of(result)
    })
}

// ── inspection ──────────────────────────────────────────────────

/// Write the heap's start and current end to `start_out` / `end_out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_heap_bounds(handle: u64, start_out: *mut u32, end_out: *mut u32) -> i32 {
    ffi_guard!({
        if start_out.is_null() || end_out.is_null() {
            return GuestHeapStatus::InvalidArgument as i32;
        }
        let Some(ctx_arc) = get_context(handle) else {
            return GuestHeapStatus::InvalidHandle as i32;
        };
        let ctx = ffi_lock!(ctx_arc);
        // SAFETY: both pointers are non-null and valid per caller contract.
        unsafe {
            *start_out = ctx.heap().heap_start();
            *end_out = ctx.heap().heap_end();
        }
        GuestHeapStatus::Ok as i32
    })
}

/// Fill `stats_out` with the context's counters.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_stats(handle: u64, stats_out: *mut GuestHeapStats) -> i32 {
    ffi_guard!({
        if stats_out.is_null() {
            return GuestHeapStatus::InvalidArgument as i32;
        }
        let Some(ctx_arc) = get_context(handle) else {
            return GuestHeapStatus::InvalidHandle as i32;
        };
        let stats = GuestHeapStats::from(&*ffi_lock!(ctx_arc));
        // SAFETY: stats_out is non-null and valid per caller contract.
        unsafe { *stats_out = stats };
        GuestHeapStatus::Ok as i32
    })
}

/// Number of live contexts, or 0 if the table is poisoned.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_context_count() -> u64 {
    ffi_guard_or!(0, {
        CONTEXTS.lock().map(|t| t.len() as u64).unwrap_or(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestheap_alloc::ArrayRecord;
    use guestheap_core::LinearMemory;

    fn create(heap_start: u32, validate: bool) -> u64 {
        let mut handle = 0u64;
        assert_eq!(
            guestheap_context_create(heap_start, u8::from(validate), &mut handle),
            GuestHeapStatus::Ok as i32
        );
        handle
    }

    fn new_object(h: u64, mem: &mut [u8], size: u32) -> u32 {
        let mut addr = 0u32;
        let status = guestheap_new_object(h, mem.as_mut_ptr(), mem.len(), size, &mut addr);
        assert_eq!(status, GuestHeapStatus::Ok as i32);
        addr
    }

    #[test]
    fn object_lifecycle() {
        let h = create(0, false);
        let mut mem = vec![0u8; 1024];
        let a = new_object(h, &mut mem, 20);
        assert_eq!(a, 4);
        assert_eq!(mem.read_u32(0), 20);

        let status = guestheap_drop_object(h, mem.as_mut_ptr(), mem.len(), a, 20);
        assert_eq!(status, GuestHeapStatus::Ok as i32);
        assert_eq!(new_object(h, &mut mem, 20), a);
        assert_eq!(guestheap_context_destroy(h), GuestHeapStatus::Ok as i32);
    }

    #[test]
    fn slice_lifecycle() {
        let h = create(0, true);
        let mut mem = vec![0u8; 1024];
        let mut handle = 0u32;
        let status = guestheap_new_slice(h, mem.as_mut_ptr(), mem.len(), 10, 4, &mut handle);
        assert_eq!(status, GuestHeapStatus::Ok as i32);
        assert_eq!(ArrayRecord::read(&mem, handle).length, 10);

        let drop = |mem: &mut Vec<u8>| guestheap_drop_slice(h, mem.as_mut_ptr(), mem.len(), handle, 4);
        assert_eq!(drop(&mut mem), GuestHeapStatus::Ok as i32);
        assert_eq!(drop(&mut mem), GuestHeapStatus::DoubleFree as i32);
        guestheap_context_destroy(h);
    }

    #[test]
    fn validation_status_codes() {
        let h = create(0, true);
        let mut mem = vec![0u8; 1024];
        let a = new_object(h, &mut mem, 8);

        let drop = |mem: &mut Vec<u8>, addr, size| {
            guestheap_drop_object(h, mem.as_mut_ptr(), mem.len(), addr, size)
        };
        assert_eq!(drop(&mut mem, a, 16), GuestHeapStatus::SizeMismatch as i32);
        assert_eq!(drop(&mut mem, 900, 8), GuestHeapStatus::OutsideHeap as i32);
        assert_eq!(drop(&mut mem, a, 8), GuestHeapStatus::Ok as i32);
        assert_eq!(drop(&mut mem, a, 8), GuestHeapStatus::DoubleFree as i32);

        let mut stats = GuestHeapStats::default();
        assert_eq!(guestheap_stats(h, &mut stats), GuestHeapStatus::Ok as i32);
        assert_eq!(stats.rejected_calls, 3);
        assert_eq!(stats.drop_object_calls, 4);
        guestheap_context_destroy(h);
    }

    #[test]
    fn heap_bounds_follow_allocations() {
        let h = create(5, false);
        let mut mem = vec![0u8; 256];
        let (mut start, mut end) = (0u32, 0u32);
        assert_eq!(guestheap_heap_bounds(h, &mut start, &mut end), 0);
        assert_eq!((start, end), (16, 16));

        new_object(h, &mut mem, 40);
        guestheap_heap_bounds(h, &mut start, &mut end);
        assert_eq!(end, 16 + 44);
        guestheap_context_destroy(h);
    }

    #[test]
    fn destroyed_handle_is_invalid() {
        let h = create(0, false);
        assert_eq!(guestheap_context_destroy(h), GuestHeapStatus::Ok as i32);
        assert_eq!(
            guestheap_context_destroy(h),
            GuestHeapStatus::InvalidHandle as i32
        );
        let mut mem = vec![0u8; 64];
        let mut addr = 0u32;
        assert_eq!(
            guestheap_new_object(h, mem.as_mut_ptr(), mem.len(), 4, &mut addr),
            GuestHeapStatus::InvalidHandle as i32
        );
    }

    #[test]
    fn null_pointers_are_rejected() {
        let h = create(0, false);
        let mut addr = 0u32;
        assert_eq!(
            guestheap_new_object(h, std::ptr::null_mut(), 64, 4, &mut addr),
            GuestHeapStatus::InvalidArgument as i32
        );
        let mut mem = vec![0u8; 64];
        assert_eq!(
            guestheap_new_object(h, mem.as_mut_ptr(), mem.len(), 4, std::ptr::null_mut()),
            GuestHeapStatus::InvalidArgument as i32
        );
        assert_eq!(
            guestheap_context_create(0, 0, std::ptr::null_mut()),
            GuestHeapStatus::InvalidArgument as i32
        );
        guestheap_context_destroy(h);
    }

    #[test]
    fn overflowing_heap_start_is_a_config_error() {
        let mut handle = 0u64;
        assert_eq!(
            guestheap_context_create(u32::MAX - 2, 0, &mut handle),
            GuestHeapStatus::ConfigError as i32
        );
    }

    #[test]
    fn exhausted_memory_panics_and_poisons_context() {
        let h = create(0, false);
        let mut mem = vec![0u8; 32];
        let mut addr = 0u32;
        let status = guestheap_new_object(h, mem.as_mut_ptr(), mem.len(), 64, &mut addr);
        assert_eq!(status, GuestHeapStatus::Panicked as i32);

        let status = guestheap_new_object(h, mem.as_mut_ptr(), mem.len(), 4, &mut addr);
        assert_eq!(status, GuestHeapStatus::InternalError as i32);
        assert_eq!(guestheap_context_destroy(h), GuestHeapStatus::Ok as i32);
    }

    #[test]
    fn destroy_releases_table_slot() {
        let h = create(0, false);
        // Other tests share the table, so only a lower bound holds.
        assert!(guestheap_context_count() >= 1);
        assert_eq!(guestheap_context_destroy(h), GuestHeapStatus::Ok as i32);
        let mut stats = GuestHeapStats::default();
        assert_eq!(
            guestheap_stats(h, &mut stats),
            GuestHeapStatus::InvalidHandle as i32
        );
    }

    #[test]
    fn contexts_are_independent() {
        let a = create(0, false);
        let b = create(0, false);
        let mut mem_a = vec![0u8; 256];
        let mut mem_b = vec![0u8; 256];
        assert_eq!(new_object(a, &mut mem_a, 8), 4);
        assert_eq!(new_object(a, &mut mem_a, 8), 16);
        assert_eq!(new_object(b, &mut mem_b, 8), 4);
        assert!(guestheap_context_count() >= 2);
        guestheap_context_destroy(a);
        guestheap_context_destroy(b);
    }
}
