//! Per-context import call counters.

use crate::imports::ImportFn;

/// Counts of import calls made through one context.
///
/// Complements the heap's own [`HeapStats`](guestheap_alloc::HeapStats):
/// these count what the guest asked for, those count how the heap
/// served it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportMetrics {
    /// Calls per import, indexed in [`ImportFn::ALL`] order.
    pub calls: [u64; 4],
    /// Calls refused by the validation layer.
    pub rejected: u64,
}

impl ImportMetrics {
    pub(crate) fn record(&mut self, func: ImportFn) {
        self.calls[func.index()] += 1;
    }

    pub(crate) fn record_rejection(&mut self) {
        self.rejected += 1;
    }

    /// Calls made to `func`, rejected ones included.
    pub fn calls(&self, func: ImportFn) -> u64 {
        self.calls[func.index()]
    }

    /// Calls made to any import.
    pub fn total_calls(&self) -> u64 {
        self.calls.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = ImportMetrics::default();
        assert_eq!(m.total_calls(), 0);
        assert_eq!(m.rejected, 0);
    }

    #[test]
    fn record_counts_per_import() {
        let mut m = ImportMetrics::default();
        m.record(ImportFn::NewObject);
        m.record(ImportFn::NewObject);
        m.record(ImportFn::DropSlice);
        m.record_rejection();
        assert_eq!(m.calls(ImportFn::NewObject), 2);
        assert_eq!(m.calls(ImportFn::DropSlice), 1);
        assert_eq!(m.calls(ImportFn::NewSlice), 0);
        assert_eq!(m.total_calls(), 3);
        assert_eq!(m.rejected, 1);
    }
}
