//! Sled-backed record store
//!
//! Table-style layout over sled trees: `records` holds one row per record
//! keyed by the big-endian sequence id, `uuid_index` is the unique
//! secondary index, and `meta` carries the schema marker plus the
//! high-water mark that survives hard deletes.

use sled::Db;
use std::ops::Bound;
use std::path::Path;
use uuid::Uuid;

use crate::errors::{VaultError, VaultResult};
use crate::log_record::{DeleteMode, LogRecord};
use crate::record_store::RecordStore;

const RECORDS_TREE: &str = "records";
const UUID_TREE: &str = "uuid_index";
const META_TREE: &str = "meta";

const SCHEMA_KEY: &[u8] = b"schema_version";
const SCHEMA_VERSION: &[u8] = b"1";
const HIGH_WATER_KEY: &[u8] = b"high_water";

pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open (or create) the sled database under `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> VaultResult<Self> {
        let path = data_dir.as_ref().join("sled");
        let db = sled::open(&path)
            .map_err(|e| VaultError::storage_write("opening sled database", e.to_string()))?;
        Ok(SledStore { db })
    }

    fn records_tree(&self) -> VaultResult<sled::Tree> {
        self.db
            .open_tree(RECORDS_TREE)
            .map_err(|e| VaultError::storage_write("opening records tree", e.to_string()))
    }

    fn uuid_tree(&self) -> VaultResult<sled::Tree> {
        self.db
            .open_tree(UUID_TREE)
            .map_err(|e| VaultError::storage_write("opening uuid index tree", e.to_string()))
    }

    fn meta_tree(&self) -> VaultResult<sled::Tree> {
        self.db
            .open_tree(META_TREE)
            .map_err(|e| VaultError::storage_write("opening meta tree", e.to_string()))
    }

    fn serialize_record(record: &LogRecord) -> VaultResult<Vec<u8>> {
        serde_json::to_vec(record).map_err(|e| VaultError::serialization("encoding record", e))
    }

    fn deserialize_record(bytes: &[u8]) -> VaultResult<LogRecord> {
        serde_json::from_slice(bytes).map_err(|e| VaultError::serialization("decoding record", e))
    }

    fn decode_key(bytes: &[u8]) -> VaultResult<u64> {
        let key: [u8; 8] = bytes
            .try_into()
            .map_err(|_| VaultError::schema("stored key is not a sequence id"))?;
        Ok(u64::from_be_bytes(key))
    }
}

impl RecordStore for SledStore {
    /// Writes the schema marker into an empty store, accepts a matching
    /// marker, and refuses anything else.
    fn ensure_schema(&self) -> VaultResult<()> {
        let records = self.records_tree()?;
        let _ = self.uuid_tree()?;
        let meta = self.meta_tree()?;

        match meta.get(SCHEMA_KEY)? {
            Some(version) if version.as_ref() == SCHEMA_VERSION => Ok(()),
            Some(version) => Err(VaultError::schema(format!(
                "incompatible schema version '{}'",
                String::from_utf8_lossy(&version)
            ))),
            None => {
                if records.first()?.is_some() {
                    return Err(VaultError::schema(
                        "store holds records but carries no schema marker",
                    ));
                }
                meta.insert(SCHEMA_KEY, SCHEMA_VERSION)?;
                meta.flush()?;
                Ok(())
            }
        }
    }

    fn write(&self, record: &LogRecord) -> VaultResult<()> {
        let records = self.records_tree()?;
        let uuids = self.uuid_tree()?;
        let meta = self.meta_tree()?;

        let key = record.sequence_id.to_be_bytes();
        let payload = Self::serialize_record(record)?;

        // The uuid may only ever map to one sequence id. Checked before
        // the row insert so a conflict leaves no partial state behind.
        if let Some(mapped) = uuids.get(record.uuid.as_bytes())? {
            if Self::decode_key(&mapped)? != record.sequence_id {
                return Err(VaultError::write_conflict(record.sequence_id));
            }
        }

        match records.get(key)? {
            Some(existing_bytes) => {
                // Rewrites must preserve the row identity.
                let existing = Self::deserialize_record(&existing_bytes)?;
                if existing.uuid != record.uuid {
                    return Err(VaultError::write_conflict(record.sequence_id));
                }
                records.insert(key, payload)?;
            }
            None => {
                // Insert-if-absent: concurrent allocators racing for the
                // same sequence id collide here and one of them retries.
                if records
                    .compare_and_swap(key, None::<&[u8]>, Some(payload))?
                    .is_err()
                {
                    return Err(VaultError::write_conflict(record.sequence_id));
                }
            }
        }

        uuids.insert(record.uuid.as_bytes(), key.to_vec())?;

        meta.update_and_fetch(HIGH_WATER_KEY, |current| {
            let mark = current
                .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
                .map(u64::from_be_bytes)
                .unwrap_or(0);
            Some(record.sequence_id.max(mark).to_be_bytes().to_vec())
        })?;

        self.db.flush()?;
        Ok(())
    }

    fn read_by_uuid(&self, uuid: Uuid) -> VaultResult<LogRecord> {
        let uuids = self.uuid_tree()?;
        let mapped = uuids
            .get(uuid.as_bytes())?
            .ok_or_else(|| VaultError::not_found("log record", uuid))?;
        let sequence_id = Self::decode_key(&mapped)?;

        let records = self.records_tree()?;
        match records.get(sequence_id.to_be_bytes())? {
            Some(bytes) => Self::deserialize_record(&bytes),
            None => Err(VaultError::not_found("log record", uuid)),
        }
    }

    fn read_by_sequence(&self, sequence_id: u64) -> VaultResult<LogRecord> {
        let records = self.records_tree()?;
        match records.get(sequence_id.to_be_bytes())? {
            Some(bytes) => Self::deserialize_record(&bytes),
            None => Err(VaultError::not_found("log record", sequence_id)),
        }
    }

    fn exists_by_sequence(&self, sequence_id: u64) -> VaultResult<bool> {
        let records = self.records_tree()?;
        match records.get(sequence_id.to_be_bytes())? {
            Some(bytes) => Ok(!Self::deserialize_record(&bytes)?.deleted),
            None => Ok(false),
        }
    }

    fn max_sequence(&self) -> VaultResult<Option<u64>> {
        let meta = self.meta_tree()?;
        if let Some(mark) = meta.get(HIGH_WATER_KEY)? {
            return Ok(Some(Self::decode_key(&mark)?));
        }
        // No mark yet: fall back to the highest stored row, if any.
        let records = self.records_tree()?;
        match records.last()? {
            Some((key, _)) => Ok(Some(Self::decode_key(&key)?)),
            None => Ok(None),
        }
    }

    fn min_sequence(&self) -> VaultResult<Option<u64>> {
        let records = self.records_tree()?;
        for item in records.iter() {
            let (_, bytes) = item?;
            let record = Self::deserialize_record(&bytes)?;
            if !record.deleted {
                return Ok(Some(record.sequence_id));
            }
        }
        Ok(None)
    }

    fn next_after(&self, sequence_id: u64) -> VaultResult<Option<u64>> {
        let records = self.records_tree()?;
        let start = sequence_id.to_be_bytes();
        for item in records.range((Bound::Excluded(start), Bound::Unbounded)) {
            let (_, bytes) = item?;
            let record = Self::deserialize_record(&bytes)?;
            if !record.deleted {
                return Ok(Some(record.sequence_id));
            }
        }
        Ok(None)
    }

    fn previous_before(&self, sequence_id: u64) -> VaultResult<Option<u64>> {
        let records = self.records_tree()?;
        let end = sequence_id.to_be_bytes();
        for item in records.range(..end).rev() {
            let (_, bytes) = item?;
            let record = Self::deserialize_record(&bytes)?;
            if !record.deleted {
                return Ok(Some(record.sequence_id));
            }
        }
        Ok(None)
    }

    fn delete(&self, uuid: Uuid, mode: DeleteMode) -> VaultResult<()> {
        let records = self.records_tree()?;
        let uuids = self.uuid_tree()?;

        let mapped = uuids
            .get(uuid.as_bytes())?
            .ok_or_else(|| VaultError::not_found("log record", uuid))?;
        let sequence_id = Self::decode_key(&mapped)?;
        let key = sequence_id.to_be_bytes();

        match mode {
            DeleteMode::Soft => {
                let bytes = records
                    .get(key)?
                    .ok_or_else(|| VaultError::not_found("log record", uuid))?;
                let mut record = Self::deserialize_record(&bytes)?;
                record.deleted = true;
                records.insert(key, Self::serialize_record(&record)?)?;
            }
            DeleteMode::Hard => {
                records.remove(key)?;
                uuids.remove(uuid.as_bytes())?;
            }
        }

        self.db.flush()?;
        Ok(())
    }
}
