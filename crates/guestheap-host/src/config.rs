//! Host context configuration.

use guestheap_alloc::HeapConfig;

// ── Validation ─────────────────────────────────────────────────────

/// Whether a context checks frees against the set of live allocations.
///
/// With [`Validation::Off`] the context forwards every call to the heap
/// unchecked, exactly like a trusting `malloc`/`free`. With
/// [`Validation::Track`] it remembers every address it hands out and
/// rejects drops of unknown, already-freed or out-of-heap addresses
/// before they can corrupt a chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Validation {
    /// Trust the guest.
    #[default]
    Off,
    /// Track live blocks and reject bad drops.
    Track,
}

impl Validation {
    /// `Track` if `enabled`, else `Off`.
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            Self::Track
        } else {
            Self::Off
        }
    }

    /// Whether tracking is enabled.
    pub fn is_tracking(self) -> bool {
        matches!(self, Self::Track)
    }
}

// ── ContextConfig ──────────────────────────────────────────────────

/// Everything needed to construct a [`HostContext`](crate::HostContext).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextConfig {
    /// Heap placement inside linear memory.
    pub heap: HeapConfig,
    /// Live-block tracking mode. Default: [`Validation::Off`].
    pub validation: Validation,
}

impl ContextConfig {
    /// Config for a heap starting at `heap_start`, validation off.
    pub fn new(heap_start: u32) -> Self {
        Self {
            heap: HeapConfig::new(heap_start),
            validation: Validation::Off,
        }
    }

    /// Same config with the given validation mode.
    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_trusts_the_guest() {
        let config = ContextConfig::default();
        assert_eq!(config.validation, Validation::Off);
        assert_eq!(config.heap.heap_start, 0);
    }

    #[test]
    fn builder_sets_validation() {
        let config = ContextConfig::new(1024).with_validation(Validation::Track);
        assert_eq!(config.heap.heap_start, 1024);
        assert!(config.validation.is_tracking());
    }

    #[test]
    fn flag_conversion() {
        assert_eq!(Validation::from_flag(true), Validation::Track);
        assert_eq!(Validation::from_flag(false), Validation::Off);
        assert!(!Validation::Off.is_tracking());
    }
}
