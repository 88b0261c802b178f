//! Identifier allocation and resolution
//!
//! Sequence ids always come from the store's authoritative high-water
//! mark at call time; nothing is cached in the process, so restarts and
//! parallel instances cannot hand out a stale id.

use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{VaultError, VaultResult};
use crate::record_store::RecordStore;

const MAX_UUID_ATTEMPTS: usize = 8;

#[derive(Clone)]
pub struct IdAllocator {
    store: Arc<dyn RecordStore>,
}

impl IdAllocator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        IdAllocator { store }
    }

    /// The next unused sequence id: high-water mark plus one, or 1 for a
    /// store that has never held a record.
    pub fn allocate_sequence(&self) -> VaultResult<u64> {
        Ok(self.store.max_sequence()?.map_or(1, |max| max + 1))
    }

    /// A fresh v4 uuid. The collision check is purely defensive; a hit
    /// re-draws, a persistent streak of hits means the entropy source is
    /// broken and is reported instead of looping forever.
    pub fn allocate_uuid(&self) -> VaultResult<Uuid> {
        for _ in 0..MAX_UUID_ATTEMPTS {
            let candidate = Uuid::new_v4();
            match self.store.read_by_uuid(candidate) {
                Err(VaultError::NotFound { .. }) => return Ok(candidate),
                Ok(_) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(VaultError::internal("uuid generation kept colliding"))
    }

    /// The uuid stored under a sequence id. Soft-deleted records resolve
    /// too; the mapping lasts for the lifetime of the record.
    pub fn resolve_uuid(&self, sequence_id: u64) -> VaultResult<Uuid> {
        Ok(self.store.read_by_sequence(sequence_id)?.uuid)
    }

    /// The sequence id stored under a uuid.
    pub fn resolve_sequence(&self, uuid: Uuid) -> VaultResult<u64> {
        Ok(self.store.read_by_uuid(uuid)?.sequence_id)
    }
}
