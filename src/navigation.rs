//! Navigation over the ordered, live sequence id space
//!
//! Boundary policy: walking past either end yields `None`, never a wrap
//! and never an error. Callers use the `None` to disable further
//! navigation. `exists`, `next`, and `previous` are independent queries;
//! none is inferred from another's result.

use std::sync::Arc;

use crate::errors::VaultResult;
use crate::id_alloc::IdAllocator;
use crate::record_store::RecordStore;

pub struct Navigation {
    store: Arc<dyn RecordStore>,
    allocator: IdAllocator,
}

impl Navigation {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let allocator = IdAllocator::new(store.clone());
        Navigation { store, allocator }
    }

    /// Smallest live sequence id, or `None` when no live records exist.
    pub fn first(&self) -> VaultResult<Option<u64>> {
        self.store.min_sequence()
    }

    /// The id a new record would receive, without creating one.
    pub fn new_id(&self) -> VaultResult<u64> {
        self.allocator.allocate_sequence()
    }

    /// Smallest live id strictly greater than `current`, which need not
    /// itself exist.
    pub fn next(&self, current: u64) -> VaultResult<Option<u64>> {
        self.store.next_after(current)
    }

    /// Largest live id strictly less than `current`.
    pub fn previous(&self, current: u64) -> VaultResult<Option<u64>> {
        self.store.previous_before(current)
    }

    /// Whether a live (non-soft-deleted) record occupies `sequence_id`.
    pub fn exists(&self, sequence_id: u64) -> VaultResult<bool> {
        self.store.exists_by_sequence(sequence_id)
    }
}
