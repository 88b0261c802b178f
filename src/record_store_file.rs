//! File-backed record store
//!
//! Persists records as an append-oriented JSONL journal. Every mutation is
//! one line, tagged `write` or `remove`; opening the store replays the
//! journal into an in-memory ordered map. A companion `uuid_index.json`
//! snapshot holds the uuid mapping and the high-water mark so external
//! readers get uuid lookups without replaying the journal.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::errors::{SafeLock, VaultError, VaultResult};
use crate::log_record::{DeleteMode, LogRecord};
use crate::record_store::RecordStore;

const JOURNAL_FILE: &str = "records.jsonl";
const INDEX_FILE: &str = "uuid_index.json";

/// One journal line. Replay applies lines in order; the last writer for a
/// sequence id wins and a remove drops the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum JournalLine {
    Write { record: LogRecord },
    Remove { sequence_id: u64, uuid: Uuid },
}

/// Durable companion index, rewritten after each mutation.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexSnapshot {
    high_water: u64,
    uuid_to_sequence: HashMap<Uuid, u64>,
}

#[derive(Debug, Default)]
struct FileStoreInner {
    records: BTreeMap<u64, LogRecord>,
    uuid_index: HashMap<Uuid, u64>,
    high_water: u64,
}

pub struct FileStore {
    journal_path: PathBuf,
    index_path: PathBuf,
    inner: Mutex<FileStoreInner>,
}

impl FileStore {
    /// Open a store rooted at `data_dir`, replaying the journal if one
    /// exists. An unparsable journal is a schema error, not a crash.
    pub fn open(data_dir: impl AsRef<Path>) -> VaultResult<Self> {
        let data_dir = data_dir.as_ref();
        let journal_path = data_dir.join(JOURNAL_FILE);
        let index_path = data_dir.join(INDEX_FILE);
        let inner = Self::replay(&journal_path)?;

        Ok(FileStore {
            journal_path,
            index_path,
            inner: Mutex::new(inner),
        })
    }

    fn replay(journal_path: &Path) -> VaultResult<FileStoreInner> {
        let mut inner = FileStoreInner::default();
        if !journal_path.exists() {
            return Ok(inner);
        }

        let file = File::open(journal_path)
            .map_err(|e| VaultError::io("opening journal for replay", e))?;
        let reader = BufReader::new(file);

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| VaultError::io("reading journal line", e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: JournalLine = serde_json::from_str(&line).map_err(|e| {
                VaultError::schema(format!(
                    "journal line {} is not a record entry: {e}",
                    index + 1
                ))
            })?;
            match entry {
                JournalLine::Write { record } => {
                    inner.high_water = inner.high_water.max(record.sequence_id);
                    inner.uuid_index.insert(record.uuid, record.sequence_id);
                    inner.records.insert(record.sequence_id, record);
                }
                JournalLine::Remove { sequence_id, uuid } => {
                    inner.high_water = inner.high_water.max(sequence_id);
                    inner.records.remove(&sequence_id);
                    inner.uuid_index.remove(&uuid);
                }
            }
        }

        Ok(inner)
    }

    fn append(&self, line: &JournalLine) -> VaultResult<()> {
        let json = serde_json::to_string(line)
            .map_err(|e| VaultError::serialization("encoding journal line", e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.journal_path)
            .map_err(|e| VaultError::io("opening journal for append", e))?;
        writeln!(file, "{json}").map_err(|e| VaultError::io("appending journal line", e))?;
        Ok(())
    }

    fn write_index_snapshot(&self, inner: &FileStoreInner) -> VaultResult<()> {
        let snapshot = IndexSnapshot {
            high_water: inner.high_water,
            uuid_to_sequence: inner.uuid_index.clone(),
        };
        let json = serde_json::to_string(&snapshot)
            .map_err(|e| VaultError::serialization("encoding uuid index", e))?;
        std::fs::write(&self.index_path, json)
            .map_err(|e| VaultError::io("writing uuid index", e))?;
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn ensure_schema(&self) -> VaultResult<()> {
        if let Some(parent) = self.journal_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VaultError::io("creating data directory", e))?;
        }
        if !self.journal_path.exists() {
            File::create(&self.journal_path).map_err(|e| VaultError::io("creating journal", e))?;
        }
        let inner = self.inner.safe_lock()?;
        self.write_index_snapshot(&inner)
    }

    fn write(&self, record: &LogRecord) -> VaultResult<()> {
        let mut inner = self.inner.safe_lock()?;

        // Uniqueness constraints checked before anything touches disk.
        if let Some(existing) = inner.records.get(&record.sequence_id) {
            if existing.uuid != record.uuid {
                return Err(VaultError::write_conflict(record.sequence_id));
            }
        }
        if let Some(&mapped) = inner.uuid_index.get(&record.uuid) {
            if mapped != record.sequence_id {
                return Err(VaultError::write_conflict(record.sequence_id));
            }
        }

        self.append(&JournalLine::Write {
            record: record.clone(),
        })?;

        inner.high_water = inner.high_water.max(record.sequence_id);
        inner.uuid_index.insert(record.uuid, record.sequence_id);
        inner.records.insert(record.sequence_id, record.clone());
        self.write_index_snapshot(&inner)
    }

    fn read_by_uuid(&self, uuid: Uuid) -> VaultResult<LogRecord> {
        let inner = self.inner.safe_lock()?;
        inner
            .uuid_index
            .get(&uuid)
            .and_then(|sequence_id| inner.records.get(sequence_id))
            .cloned()
            .ok_or_else(|| VaultError::not_found("log record", uuid))
    }

    fn read_by_sequence(&self, sequence_id: u64) -> VaultResult<LogRecord> {
        let inner = self.inner.safe_lock()?;
        inner
            .records
            .get(&sequence_id)
            .cloned()
            .ok_or_else(|| VaultError::not_found("log record", sequence_id))
    }

    fn exists_by_sequence(&self, sequence_id: u64) -> VaultResult<bool> {
        let inner = self.inner.safe_lock()?;
        Ok(inner
            .records
            .get(&sequence_id)
            .map(|record| !record.deleted)
            .unwrap_or(false))
    }

    fn max_sequence(&self) -> VaultResult<Option<u64>> {
        let inner = self.inner.safe_lock()?;
        Ok(if inner.high_water == 0 {
            None
        } else {
            Some(inner.high_water)
        })
    }

    fn min_sequence(&self) -> VaultResult<Option<u64>> {
        let inner = self.inner.safe_lock()?;
        Ok(inner
            .records
            .values()
            .find(|record| !record.deleted)
            .map(|record| record.sequence_id))
    }

    fn next_after(&self, sequence_id: u64) -> VaultResult<Option<u64>> {
        let inner = self.inner.safe_lock()?;
        Ok(inner
            .records
            .range((Bound::Excluded(sequence_id), Bound::Unbounded))
            .find(|(_, record)| !record.deleted)
            .map(|(id, _)| *id))
    }

    fn previous_before(&self, sequence_id: u64) -> VaultResult<Option<u64>> {
        let inner = self.inner.safe_lock()?;
        Ok(inner
            .records
            .range(..sequence_id)
            .rev()
            .find(|(_, record)| !record.deleted)
            .map(|(id, _)| *id))
    }

    fn delete(&self, uuid: Uuid, mode: DeleteMode) -> VaultResult<()> {
        let mut inner = self.inner.safe_lock()?;
        let sequence_id = match inner.uuid_index.get(&uuid) {
            Some(&id) => id,
            None => return Err(VaultError::not_found("log record", uuid)),
        };

        match mode {
            DeleteMode::Soft => {
                let mut record = inner
                    .records
                    .get(&sequence_id)
                    .cloned()
                    .ok_or_else(|| VaultError::not_found("log record", uuid))?;
                record.deleted = true;
                self.append(&JournalLine::Write {
                    record: record.clone(),
                })?;
                inner.records.insert(sequence_id, record);
            }
            DeleteMode::Hard => {
                self.append(&JournalLine::Remove { sequence_id, uuid })?;
                inner.records.remove(&sequence_id);
                inner.uuid_index.remove(&uuid);
            }
        }

        self.write_index_snapshot(&inner)
    }
}
