//! C-compatible status codes.
//!
//! [`GuestHeapStatus`] is a `repr(i32)` enum covering every way a C ABI
//! call can fail. Conversions from the Rust error types are provided.

use guestheap_core::{ConfigError, ValidationError};
use guestheap_host::ImportError;

/// C-compatible status code returned by all FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuestHeapStatus {
    /// Success.
    Ok = 0,
    /// Handle is invalid or was already destroyed.
    InvalidHandle = -1,
    /// A pointer argument is null or an argument is out of range.
    InvalidArgument = -2,
    /// The heap configuration was rejected.
    ConfigError = -3,
    /// Validation: the address was never allocated.
    UnknownAddress = -4,
    /// Validation: the address was already freed.
    DoubleFree = -5,
    /// Validation: the address lies outside the heap.
    OutsideHeap = -6,
    /// Validation: the declared size exceeds the block.
    SizeMismatch = -7,
    /// Internal error (e.g. a context poisoned by an earlier fault).
    InternalError = -20,
    /// A Rust panic (a heap fault) was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&ConfigError> for GuestHeapStatus {
    fn from(_: &ConfigError) -> Self {
        GuestHeapStatus::ConfigError
    }
}

impl From<&ValidationError> for GuestHeapStatus {
    fn from(e: &ValidationError) -> Self {
        match e {
            ValidationError::UnknownAddress { .. } => GuestHeapStatus::UnknownAddress,
            ValidationError::DoubleFree { .. } => GuestHeapStatus::DoubleFree,
            ValidationError::OutsideHeap { .. } => GuestHeapStatus::OutsideHeap,
            ValidationError::SizeMismatch { .. } => GuestHeapStatus::SizeMismatch,
        }
    }
}

impl From<&ImportError> for GuestHeapStatus {
    fn from(e: &ImportError) -> Self {
        match e {
            ImportError::UnknownImport { .. } | ImportError::ArityMismatch { .. } => {
                GuestHeapStatus::InvalidArgument
            }
            ImportError::Validation(v) => GuestHeapStatus::from(v),
        }
    }
}
