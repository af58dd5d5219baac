//! C ABI for the guestheap allocator.
//!
//! For host runtimes not written in Rust. Each guest instance gets a
//! context behind an opaque `u64` handle; every allocator call passes the
//! handle plus a pointer to the instance's linear memory, which is
//! borrowed only for the duration of that call.
//!
//! Every function returns a [`GuestHeapStatus`] code as `i32`. A heap
//! fault (running out of memory, arithmetic overflow, an access past the
//! buffer) is a Rust panic; it is caught at the boundary, reported as
//! `Panicked` (-128), and leaves that context poisoned. Later calls on a
//! poisoned context return `InternalError`; destroy it.
//!
//! This is the only crate in the workspace that contains `unsafe` code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

use std::any::Any;
use std::cell::RefCell;
use std::ffi::c_char;

/// Run `$body`, turning a panic into `Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {
        ffi_guard_or!($crate::status::GuestHeapStatus::Panicked as i32, $body)
    };
}

/// Run `$body`, turning a panic into `$fallback`.
macro_rules! ffi_guard_or {
    ($fallback:expr, $body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(value) => value,
            Err(payload) => {
                $crate::record_panic(payload);
                $fallback
            }
        }
    };
}

/// Lock a mutex, returning `InternalError` from the guarded body if it is
/// poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::GuestHeapStatus::InternalError as i32,
        }
    };
}

pub mod context;
mod handle;
pub mod stats;
pub mod status;

pub use context::{
    guestheap_context_create, guestheap_context_destroy, guestheap_drop_object,
    guestheap_drop_slice, guestheap_heap_bounds, guestheap_new_object, guestheap_new_slice,
    guestheap_stats,
};
pub use stats::GuestHeapStats;
pub use status::GuestHeapStatus;

thread_local! {
    /// Message of the most recent panic caught on this thread.
    static LAST_PANIC: RefCell<String> = const { RefCell::new(String::new()) };
}

pub(crate) fn record_panic(payload: Box<dyn Any + Send>) {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    tracing::error!(%message, "panic caught at C boundary");
    LAST_PANIC.with(|cell| *cell.borrow_mut() = message);
}

/// Copy the last caught panic message on this thread into `buf`.
///
/// Returns the full message length in bytes (excluding the terminator),
/// or 0 if no panic has been caught. At most `cap - 1` bytes are copied,
/// followed by a NUL. Passing a null `buf` just queries the length.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn guestheap_last_panic_message(buf: *mut c_char, cap: usize) -> i32 {
    LAST_PANIC.with(|cell| {
        let message = cell.borrow();
        let bytes = message.as_bytes();
        if !buf.is_null() && cap > 0 {
            let n = bytes.len().min(cap - 1);
            // SAFETY: caller guarantees `buf` points to `cap` writable bytes;
            // `n + 1 <= cap`.
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), n);
                *buf.add(n) = 0;
            }
        }
        i32::try_from(bytes.len()).unwrap_or(i32::MAX)
    })
}
