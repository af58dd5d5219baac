//! Error types for guestheap.
//!
//! The allocator's observed contract surfaces no errors: bad frees corrupt
//! chains silently and out-of-range access is a fatal fault. The two enums
//! here cover what sits around that contract: rejecting an unusable
//! configuration, and the opt-in validation layer.

use std::error::Error;
use std::fmt;

/// Errors detected while constructing a heap from its configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Rounding the heap start up to its 8-byte boundary overflows the
    /// 32-bit address space.
    HeapStartOverflow {
        /// The requested (unrounded) heap start.
        heap_start: u32,
    },
    /// The (rounded) heap start lies beyond the end of linear memory.
    HeapStartOutOfBounds {
        /// The rounded heap start.
        heap_start: u32,
        /// Linear memory size in bytes.
        memory_size: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeapStartOverflow { heap_start } => {
                write!(f, "heap start {heap_start:#x} overflows when aligned")
            }
            Self::HeapStartOutOfBounds {
                heap_start,
                memory_size,
            } => {
                write!(
                    f,
                    "heap start {heap_start:#x} is beyond linear memory ({memory_size} bytes)"
                )
            }
        }
    }
}

impl Error for ConfigError {}

/// Caller-contract violations caught by the optional validation layer.
///
/// Only produced when a context is configured to track live blocks. A call
/// that produces one of these is rejected before it reaches the heap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The address was never returned by an allocation.
    UnknownAddress {
        /// Payload address passed by the guest.
        addr: u32,
    },
    /// The address was allocated once but has already been freed.
    DoubleFree {
        /// Payload address passed by the guest.
        addr: u32,
    },
    /// The address does not point inside the heap region.
    OutsideHeap {
        /// Payload address passed by the guest.
        addr: u32,
        /// Start of the heap region.
        heap_start: u32,
        /// Current end of the heap region.
        heap_end: u32,
    },
    /// The guest declared a size larger than the block it is releasing.
    SizeMismatch {
        /// Payload address passed by the guest.
        addr: u32,
        /// Size the guest claims the object has.
        declared: u32,
        /// Payload size recorded in the block header.
        actual: u32,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAddress { addr } => {
                write!(f, "free of unknown address {addr:#x}")
            }
            Self::DoubleFree { addr } => write!(f, "double free of {addr:#x}"),
            Self::OutsideHeap {
                addr,
                heap_start,
                heap_end,
            } => {
                write!(
                    f,
                    "address {addr:#x} is outside the heap [{heap_start:#x}, {heap_end:#x})"
                )
            }
            Self::SizeMismatch {
                addr,
                declared,
                actual,
            } => {
                write!(
                    f,
                    "object at {addr:#x} dropped as {declared} bytes but holds {actual}"
                )
            }
        }
    }
}

impl Error for ValidationError {}
