//! Storage contract for log records
//!
//! One trait, implemented identically by the file-backed and sled-backed
//! adapters. Everything above this layer is medium-agnostic; no method
//! here performs business validation.

use std::sync::Arc;
use uuid::Uuid;

use crate::config_loader::{BackendKind, VaultConfig};
use crate::errors::VaultResult;
use crate::log_record::{DeleteMode, LogRecord};
use crate::record_store_file::FileStore;
use crate::record_store_sled::SledStore;

pub trait RecordStore: Send + Sync {
    /// Idempotently create the underlying structure. Safe to call on every
    /// startup; fails with a schema error when the existing structure is
    /// incompatible.
    fn ensure_schema(&self) -> VaultResult<()>;

    /// Upsert one record keyed by `sequence_id`. A row under the same
    /// sequence id with a different uuid (or the reverse) is a write
    /// conflict; the write also advances the durable high-water mark.
    fn write(&self, record: &LogRecord) -> VaultResult<()>;

    /// Raw read by uuid. Soft-deleted records are returned too; visibility
    /// policy lives above the adapter.
    fn read_by_uuid(&self, uuid: Uuid) -> VaultResult<LogRecord>;

    /// Raw read by sequence id, tombstones included.
    fn read_by_sequence(&self, sequence_id: u64) -> VaultResult<LogRecord>;

    /// True only for a present, non-soft-deleted record.
    fn exists_by_sequence(&self, sequence_id: u64) -> VaultResult<bool>;

    /// Highest sequence id ever assigned (the high-water mark), `None`
    /// when the store has never held a record. Hard deletes do not lower
    /// it, so ids are never handed out twice.
    fn max_sequence(&self) -> VaultResult<Option<u64>>;

    /// Lowest non-soft-deleted sequence id, `None` when no live records
    /// exist.
    fn min_sequence(&self) -> VaultResult<Option<u64>>;

    /// Smallest live sequence id strictly greater than `sequence_id`,
    /// `None` at the upper boundary. `sequence_id` itself need not exist.
    fn next_after(&self, sequence_id: u64) -> VaultResult<Option<u64>>;

    /// Largest live sequence id strictly less than `sequence_id`, `None`
    /// at the lower boundary.
    fn previous_before(&self, sequence_id: u64) -> VaultResult<Option<u64>>;

    /// Soft delete sets the tombstone flag in place; hard delete removes
    /// the row and its uuid index entry. Unknown uuids are not found.
    fn delete(&self, uuid: Uuid, mode: DeleteMode) -> VaultResult<()>;
}

/// Open the configured backend and make sure its schema is in place.
pub fn open_store(config: &VaultConfig) -> VaultResult<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.backend {
        BackendKind::File => Arc::new(FileStore::open(&config.data_dir)?),
        BackendKind::Sled => Arc::new(SledStore::open(&config.data_dir)?),
    };
    store.ensure_schema()?;
    Ok(store)
}
