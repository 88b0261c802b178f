//! Record lifecycle: create, update, delete, and read visibility
//!
//! Validation runs on the raw input before anything touches storage, and
//! names every offending field at once. Free text is sanitized after
//! validation and before persistence. No partial write is ever
//! observable: a failure at any step leaves the store exactly as it was.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{VaultError, VaultResult};
use crate::id_alloc::IdAllocator;
use crate::log_record::{DeleteMode, LogLevel, LogRecord, LogStatus, RecordDraft};
use crate::record_store::RecordStore;
use crate::sanitize::{clean_misc, clean_text};

/// Validated and sanitized draft fields, ready to persist.
struct ValidFields {
    notes: String,
    source: String,
    level: LogLevel,
    status: LogStatus,
    misc: Option<Map<String, Value>>,
}

fn validate_draft(draft: &RecordDraft) -> VaultResult<ValidFields> {
    let mut offending = Vec::new();

    let notes = draft.notes.as_deref().filter(|n| !n.trim().is_empty());
    if notes.is_none() {
        offending.push("notes".to_string());
    }
    let source = draft.source.as_deref().filter(|s| !s.trim().is_empty());
    if source.is_none() {
        offending.push("source".to_string());
    }
    let level = draft
        .level
        .as_deref()
        .and_then(|raw| raw.parse::<LogLevel>().ok());
    if level.is_none() {
        offending.push("level".to_string());
    }
    let status = draft
        .status
        .as_deref()
        .and_then(|raw| raw.parse::<LogStatus>().ok());
    if status.is_none() {
        offending.push("status".to_string());
    }

    if !offending.is_empty() {
        return Err(VaultError::validation(offending));
    }

    let notes = notes.ok_or_else(|| VaultError::validation_field("notes"))?;
    let source = source.ok_or_else(|| VaultError::validation_field("source"))?;
    let level = level.ok_or_else(|| VaultError::validation_field("level"))?;
    let status = status.ok_or_else(|| VaultError::validation_field("status"))?;

    Ok(ValidFields {
        notes: clean_text(notes),
        source: clean_text(source),
        level,
        status,
        misc: draft.misc.as_ref().map(clean_misc),
    })
}

pub struct RecordLifecycle {
    store: Arc<dyn RecordStore>,
    allocator: IdAllocator,
}

impl RecordLifecycle {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let allocator = IdAllocator::new(store.clone());
        RecordLifecycle { store, allocator }
    }

    /// Validate, allocate identifiers, and persist a new record. Returns
    /// the assigned sequence id and uuid. A lost allocation race surfaces
    /// as a write conflict and is retried exactly once with a fresh
    /// allocation.
    pub fn create(&self, draft: &RecordDraft) -> VaultResult<(u64, Uuid)> {
        let fields = validate_draft(draft)?;
        let created_at = Utc::now();
        let mut retried = false;

        loop {
            let sequence_id = self.allocator.allocate_sequence()?;
            let uuid = self.allocator.allocate_uuid()?;
            let record = LogRecord {
                sequence_id,
                uuid,
                notes: fields.notes.clone(),
                source: fields.source.clone(),
                level: fields.level,
                status: fields.status,
                misc: fields.misc.clone(),
                created_at,
                updated_at: None,
                deleted: false,
            };

            match self.store.write(&record) {
                Ok(()) => {
                    info!(sequence_id, %uuid, level = %fields.level, "log record created");
                    return Ok((sequence_id, uuid));
                }
                Err(VaultError::WriteConflict { .. }) if !retried => {
                    warn!(sequence_id, "sequence allocation lost a race, retrying");
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Replace the mutable fields of the record behind `uuid`. Unknown
    /// and soft-deleted records are not found; identity and `created_at`
    /// are preserved and `updated_at` is stamped.
    pub fn update(&self, uuid: Uuid, draft: &RecordDraft) -> VaultResult<()> {
        let existing = self.store.read_by_uuid(uuid)?;
        if existing.deleted {
            return Err(VaultError::not_found("log record", uuid));
        }

        let fields = validate_draft(draft)?;
        let record = LogRecord {
            sequence_id: existing.sequence_id,
            uuid: existing.uuid,
            notes: fields.notes,
            source: fields.source,
            level: fields.level,
            status: fields.status,
            misc: fields.misc,
            created_at: existing.created_at,
            updated_at: Some(Utc::now()),
            deleted: false,
        };

        self.store.write(&record)?;
        info!(sequence_id = record.sequence_id, %uuid, "log record updated");
        Ok(())
    }

    /// Delete the record that both identifiers name. A pair naming two
    /// different records is a mismatch and nothing happens. Soft mode
    /// cannot reach an already-soft-deleted record; hard mode can.
    pub fn delete(&self, sequence_id: u64, uuid: Uuid, mode: DeleteMode) -> VaultResult<()> {
        let record = self.store.read_by_sequence(sequence_id)?;
        if record.uuid != uuid {
            return Err(VaultError::mismatch(sequence_id, uuid));
        }
        if record.deleted && mode == DeleteMode::Soft {
            return Err(VaultError::not_found("log record", uuid));
        }

        self.store.delete(uuid, mode)?;
        match mode {
            DeleteMode::Soft => info!(sequence_id, %uuid, "log record soft-deleted"),
            DeleteMode::Hard => warn!(sequence_id, %uuid, "log record hard-deleted"),
        }
        Ok(())
    }

    /// Read a record by uuid. Soft-deleted records stay hidden unless the
    /// caller holds elevated access.
    pub fn fetch(&self, uuid: Uuid, elevated: bool) -> VaultResult<LogRecord> {
        let record = self.store.read_by_uuid(uuid)?;
        if record.deleted && !elevated {
            return Err(VaultError::not_found("log record", uuid));
        }
        Ok(record)
    }
}
