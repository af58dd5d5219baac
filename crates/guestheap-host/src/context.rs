//! The per-instance host context.
//!
//! One [`HostContext`] exists per guest-module instance. The embedding
//! runtime passes it by `&mut`, together with the instance's linear
//! memory, into every import call; nothing about a guest's heap lives in
//! global state.

use guestheap_alloc::{ArrayRecord, ChainReport, GuestHeap, LiveSet, ARRAY_RECORD_SIZE};
use guestheap_core::{ConfigError, LinearMemory, ValidationError};

use crate::config::{ContextConfig, Validation};
use crate::error::ImportError;
use crate::imports::{ImportCall, ImportFn};
use crate::metrics::ImportMetrics;

// ── HostContext ────────────────────────────────────────────────────

/// Host-side state for one guest instance: its heap, optional live-block
/// tracking, and call counters.
#[derive(Clone, Debug)]
pub struct HostContext {
    heap: GuestHeap,
    live: Option<LiveSet>,
    metrics: ImportMetrics,
}

impl HostContext {
    /// Create a context without checking the heap start against memory.
    pub fn new(config: &ContextConfig) -> Result<Self, ConfigError> {
        let heap = GuestHeap::new(&config.heap)?;
        Ok(Self::with_heap(heap, config.validation))
    }

    /// Create a context whose heap start must lie inside `mem`.
    pub fn attach<M: LinearMemory + ?Sized>(
        config: &ContextConfig,
        mem: &M,
    ) -> Result<Self, ConfigError> {
        let heap = GuestHeap::attach(&config.heap, mem)?;
        Ok(Self::with_heap(heap, config.validation))
    }

    fn with_heap(heap: GuestHeap, validation: Validation) -> Self {
        tracing::debug!(
            heap_start = heap.heap_start(),
            ?validation,
            "host context created"
        );
        Self {
            heap,
            live: validation.is_tracking().then(LiveSet::new),
            metrics: ImportMetrics::default(),
        }
    }

    // ── imports ────────────────────────────────────────────────────

    /// `core.new_object(size) -> addr`.
    ///
    /// # Panics
    ///
    /// Panics if the heap cannot grow inside `mem`.
    pub fn new_object<M: LinearMemory + ?Sized>(&mut self, mem: &mut M, size: u32) -> u32 {
        self.metrics.record(ImportFn::NewObject);
        let addr = self.heap.allocate(mem, size);
        self.track(mem, addr);
        addr
    }

    /// `core.drop_object(addr, size)`.
    ///
    /// `size` is only consulted when validating, where it may not exceed
    /// the block's actual size.
    pub fn drop_object<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        addr: u32,
        size: u32,
    ) -> Result<(), ImportError> {
        self.metrics.record(ImportFn::DropObject);
        if let Err(e) = self.check_free(addr, Some(size)) {
            return Err(self.reject(ImportFn::DropObject, e));
        }
        self.heap.free(mem, addr);
        self.untrack(addr);
        Ok(())
    }

    /// `core.new_slice(length, element_size) -> handle`.
    ///
    /// # Panics
    ///
    /// Panics if `length * element_size` overflows or the heap cannot
    /// grow inside `mem`.
    pub fn new_slice<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        length: u32,
        element_size: u32,
    ) -> u32 {
        self.metrics.record(ImportFn::NewSlice);
        let handle = self.heap.allocate_array(mem, length, element_size);
        if self.live.is_some() {
            let data = ArrayRecord::read(mem, handle).data;
            self.track(mem, handle);
            self.track(mem, data);
        }
        handle
    }

    /// `core.drop_slice(handle, element_size)`.
    ///
    /// When validating, both the control block and the content block it
    /// points at must be live, and `length * element_size` may not exceed
    /// the content block.
    pub fn drop_slice<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        handle: u32,
        element_size: u32,
    ) -> Result<(), ImportError> {
        self.metrics.record(ImportFn::DropSlice);
        if let Err(e) = self.check_slice(mem, handle, element_size) {
            return Err(self.reject(ImportFn::DropSlice, e));
        }
        let data = if self.live.is_some() {
            Some(ArrayRecord::read(mem, handle).data)
        } else {
            None
        };
        self.heap.free_array(mem, handle, element_size);
        if let Some(data) = data {
            self.untrack(data);
        }
        self.untrack(handle);
        Ok(())
    }

    /// Execute a decoded call.
    ///
    /// Returns the import's result for `new_object`/`new_slice`, `None`
    /// for the drops.
    pub fn dispatch<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        call: &ImportCall,
    ) -> Result<Option<u32>, ImportError> {
        match call.func() {
            ImportFn::NewObject => Ok(Some(self.new_object(mem, call.arg0()))),
            ImportFn::DropObject => self.drop_object(mem, call.arg0(), call.arg1()).map(|()| None),
            ImportFn::NewSlice => Ok(Some(self.new_slice(mem, call.arg0(), call.arg1()))),
            ImportFn::DropSlice => self.drop_slice(mem, call.arg0(), call.arg1()).map(|()| None),
        }
    }

    /// Resolve an import by name and execute it.
    pub fn call<M: LinearMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        name: &str,
        args: &[u32],
    ) -> Result<Option<u32>, ImportError> {
        let call = ImportCall::parse(name, args)?;
        self.dispatch(mem, &call)
    }

    // ── accessors ──────────────────────────────────────────────────

    /// The underlying heap.
    pub fn heap(&self) -> &GuestHeap {
        &self.heap
    }

    /// Live-block set, when validating.
    pub fn live(&self) -> Option<&LiveSet> {
        self.live.as_ref()
    }

    /// The context's validation mode.
    pub fn validation(&self) -> Validation {
        Validation::from_flag(self.live.is_some())
    }

    /// Import call counters.
    pub fn metrics(&self) -> &ImportMetrics {
        &self.metrics
    }

    /// Walk the heap's free chains.
    pub fn chain_report<M: LinearMemory + ?Sized>(&self, mem: &M) -> ChainReport {
        self.heap.chain_report(mem)
    }

    // ── validation ─────────────────────────────────────────────────

    fn track<M: LinearMemory + ?Sized>(&mut self, mem: &M, addr: u32) {
        if let Some(live) = &mut self.live {
            live.record_alloc(addr, self.heap.block_size(mem, addr));
        }
    }

    fn untrack(&mut self, addr: u32) {
        if let Some(live) = &mut self.live {
            live.record_free(addr);
        }
    }

    fn check_free(&self, addr: u32, declared: Option<u32>) -> Result<(), ValidationError> {
        match &self.live {
            Some(live) => live.check_free(&self.heap, addr, declared).map(|_| ()),
            None => Ok(()),
        }
    }

    fn check_slice<M: LinearMemory + ?Sized>(
        &self,
        mem: &M,
        handle: u32,
        element_size: u32,
    ) -> Result<(), ValidationError> {
        if self.live.is_none() {
            return Ok(());
        }
        self.check_free(handle, Some(ARRAY_RECORD_SIZE))?;
        let record = ArrayRecord::read(mem, handle);
        let bytes = record.length.saturating_mul(element_size);
        self.check_free(record.data, Some(bytes))
    }

    fn reject(&mut self, func: ImportFn, error: ValidationError) -> ImportError {
        self.metrics.record_rejection();
        tracing::warn!(import = func.name(), %error, "import call rejected");
        ImportError::Validation(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(validation: Validation) -> (HostContext, Vec<u8>) {
        let mem = vec![0u8; 4096];
        let config = ContextConfig::new(0).with_validation(validation);
        (HostContext::attach(&config, &mem).unwrap(), mem)
    }

    #[test]
    fn attach_rejects_heap_past_memory() {
        let mem = vec![0u8; 64];
        assert!(matches!(
            HostContext::attach(&ContextConfig::new(128), &mem),
            Err(ConfigError::HeapStartOutOfBounds { .. })
        ));
    }

    #[test]
    fn new_context_reports_its_mode() {
        let (ctx, _) = context(Validation::Off);
        assert_eq!(ctx.validation(), Validation::Off);
        assert!(ctx.live().is_none());

        let (ctx, _) = context(Validation::Track);
        assert_eq!(ctx.validation(), Validation::Track);
        assert_eq!(ctx.live().map(LiveSet::live_count), Some(0));
    }

    #[test]
    fn object_round_trip_without_validation() {
        let (mut ctx, mut mem) = context(Validation::Off);
        let a = ctx.new_object(&mut mem, 20);
        ctx.drop_object(&mut mem, a, 20).unwrap();
        assert_eq!(ctx.new_object(&mut mem, 20), a);
        assert_eq!(ctx.metrics().calls(ImportFn::NewObject), 2);
    }

    #[test]
    fn unvalidated_drop_ignores_size_argument() {
        let (mut ctx, mut mem) = context(Validation::Off);
        let a = ctx.new_object(&mut mem, 8);
        ctx.drop_object(&mut mem, a, 9999).unwrap();
        // Routed by header size (8), not by the argument.
        assert_eq!(ctx.heap().bucket_head(1).map(|b| b.payload()), Some(a));
    }

    #[test]
    fn tracking_records_header_size() {
        let (mut ctx, mut mem) = context(Validation::Track);
        let a = ctx.new_object(&mut mem, 3);
        let live = ctx.live().unwrap();
        assert!(live.is_live(a));
        assert_eq!(live.iter().collect::<Vec<_>>(), vec![(a, 4)]);
    }

    #[test]
    fn double_drop_is_rejected_and_heap_untouched() {
        let (mut ctx, mut mem) = context(Validation::Track);
        let a = ctx.new_object(&mut mem, 16);
        ctx.drop_object(&mut mem, a, 16).unwrap();

        let before = mem.clone();
        let err = ctx.drop_object(&mut mem, a, 16).unwrap_err();
        assert_eq!(
            err,
            ImportError::Validation(ValidationError::DoubleFree { addr: a })
        );
        assert_eq!(mem, before);
        assert_eq!(ctx.metrics().rejected, 1);
        assert_eq!(ctx.heap().stats().bucket_frees, 1);
    }

    #[test]
    fn oversized_drop_is_rejected() {
        let (mut ctx, mut mem) = context(Validation::Track);
        let a = ctx.new_object(&mut mem, 8);
        assert!(matches!(
            ctx.drop_object(&mut mem, a, 64),
            Err(ImportError::Validation(ValidationError::SizeMismatch { .. }))
        ));
        assert!(ctx.live().unwrap().is_live(a));
    }

    #[test]
    fn slice_round_trip_with_validation() {
        let (mut ctx, mut mem) = context(Validation::Track);
        let handle = ctx.new_slice(&mut mem, 10, 4);
        let data = ArrayRecord::read(&mem, handle).data;
        assert_eq!(ctx.live().unwrap().live_count(), 2);

        ctx.drop_slice(&mut mem, handle, 4).unwrap();
        assert_eq!(ctx.live().unwrap().live_count(), 0);
        assert!(matches!(
            ctx.drop_object(&mut mem, data, 40),
            Err(ImportError::Validation(ValidationError::DoubleFree { .. }))
        ));
    }

    #[test]
    fn slice_dropped_with_larger_element_size_is_rejected() {
        let (mut ctx, mut mem) = context(Validation::Track);
        let handle = ctx.new_slice(&mut mem, 10, 4);
        let data = ArrayRecord::read(&mem, handle).data;
        assert_eq!(
            ctx.drop_slice(&mut mem, handle, 8),
            Err(ImportError::Validation(ValidationError::SizeMismatch {
                addr: data,
                declared: 80,
                actual: 40
            }))
        );
        assert_eq!(ctx.live().unwrap().live_count(), 2);
    }

    #[test]
    fn object_handle_is_not_a_slice() {
        let (mut ctx, mut mem) = context(Validation::Track);
        let a = ctx.new_object(&mut mem, 8);
        // The first word of a fresh block is zero, which no live block has
        // as its payload address.
        assert!(matches!(
            ctx.drop_slice(&mut mem, a, 1),
            Err(ImportError::Validation(_))
        ));
    }

    #[test]
    fn call_dispatches_by_name() {
        let (mut ctx, mut mem) = context(Validation::Off);
        let a = ctx.call(&mut mem, "new_object", &[12]).unwrap();
        assert_eq!(a, Some(4));
        assert_eq!(ctx.call(&mut mem, "drop_object", &[4, 12]).unwrap(), None);
        assert!(matches!(
            ctx.call(&mut mem, "new_slice", &[1]),
            Err(ImportError::ArityMismatch { got: 1, .. })
        ));
        assert_eq!(ctx.metrics().total_calls(), 2);
    }
}
