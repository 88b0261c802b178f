// Adapter conformance: every check in this file runs against both the
// file-backed and the sled-backed store, which must behave identically.

use chrono::Utc;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use crate::errors::VaultError;
use crate::log_record::{DeleteMode, LogLevel, LogRecord, LogStatus};
use crate::record_store::RecordStore;
use crate::record_store_file::FileStore;
use crate::record_store_sled::SledStore;

fn sample_record(sequence_id: u64, uuid: Uuid) -> LogRecord {
    LogRecord {
        sequence_id,
        uuid,
        notes: format!("entry {sequence_id}"),
        source: "conformance".to_string(),
        level: LogLevel::Info,
        status: LogStatus::New,
        misc: None,
        created_at: Utc::now(),
        updated_at: None,
        deleted: false,
    }
}

/// Run one conformance check against each adapter in turn, each on a
/// fresh temp directory.
fn each_store(check: impl Fn(Arc<dyn RecordStore>)) {
    let file_dir = TempDir::new().expect("temp dir for file store");
    let file_store = FileStore::open(file_dir.path()).expect("open file store");
    file_store.ensure_schema().expect("file schema");
    check(Arc::new(file_store));

    let sled_dir = TempDir::new().expect("temp dir for sled store");
    let sled_store = SledStore::open(sled_dir.path()).expect("open sled store");
    sled_store.ensure_schema().expect("sled schema");
    check(Arc::new(sled_store));
}

#[test]
fn ensure_schema_is_idempotent() {
    each_store(|store| {
        store.ensure_schema().expect("second ensure_schema");

        let uuid = Uuid::new_v4();
        store.write(&sample_record(1, uuid)).expect("write");

        // Calling it again on a populated store loses nothing.
        store.ensure_schema().expect("ensure_schema after write");
        let back = store.read_by_sequence(1).expect("read after ensure");
        assert_eq!(back.uuid, uuid);
    });
}

#[test]
fn write_then_read_round_trip() {
    each_store(|store| {
        let uuid = Uuid::new_v4();
        let mut record = sample_record(1, uuid);
        record.misc = serde_json::json!({ "host": "node-1" })
            .as_object()
            .cloned();
        store.write(&record).expect("write");

        let by_uuid = store.read_by_uuid(uuid).expect("read_by_uuid");
        assert_eq!(by_uuid.sequence_id, 1);
        assert_eq!(by_uuid.notes, "entry 1");
        assert_eq!(by_uuid.level, LogLevel::Info);
        assert_eq!(by_uuid.status, LogStatus::New);
        assert_eq!(by_uuid.misc.as_ref().unwrap()["host"], "node-1");

        let by_sequence = store.read_by_sequence(1).expect("read_by_sequence");
        assert_eq!(by_sequence.uuid, uuid);
    });
}

#[test]
fn unknown_identifiers_are_not_found() {
    each_store(|store| {
        assert!(matches!(
            store.read_by_uuid(Uuid::new_v4()),
            Err(VaultError::NotFound { .. })
        ));
        assert!(matches!(
            store.read_by_sequence(42),
            Err(VaultError::NotFound { .. })
        ));
        assert!(!store.exists_by_sequence(42).expect("exists"));
    });
}

#[test]
fn duplicate_sequence_id_is_a_write_conflict() {
    each_store(|store| {
        store
            .write(&sample_record(1, Uuid::new_v4()))
            .expect("first write");

        // Same sequence id under a different uuid is the allocation-race
        // signature and must be rejected, not upserted over.
        let result = store.write(&sample_record(1, Uuid::new_v4()));
        assert!(matches!(
            result,
            Err(VaultError::WriteConflict { sequence_id: 1 })
        ));
    });
}

#[test]
fn uuid_cannot_map_to_two_sequence_ids() {
    each_store(|store| {
        let uuid = Uuid::new_v4();
        store.write(&sample_record(1, uuid)).expect("first write");

        let result = store.write(&sample_record(2, uuid));
        assert!(matches!(result, Err(VaultError::WriteConflict { .. })));
    });
}

#[test]
fn rewrite_of_same_row_is_an_upsert() {
    each_store(|store| {
        let uuid = Uuid::new_v4();
        store.write(&sample_record(1, uuid)).expect("first write");

        let mut updated = sample_record(1, uuid);
        updated.notes = "rewritten".to_string();
        updated.updated_at = Some(Utc::now());
        store.write(&updated).expect("rewrite");

        let back = store.read_by_sequence(1).expect("read");
        assert_eq!(back.notes, "rewritten");
        assert!(back.updated_at.is_some());
    });
}

#[test]
fn min_max_next_previous_over_live_rows() {
    each_store(|store| {
        assert_eq!(store.max_sequence().expect("max empty"), None);
        assert_eq!(store.min_sequence().expect("min empty"), None);

        for id in 1..=3 {
            store.write(&sample_record(id, Uuid::new_v4())).expect("write");
        }

        assert_eq!(store.min_sequence().expect("min"), Some(1));
        assert_eq!(store.max_sequence().expect("max"), Some(3));
        assert_eq!(store.next_after(1).expect("next"), Some(2));
        assert_eq!(store.next_after(3).expect("next at top"), None);
        assert_eq!(store.previous_before(3).expect("previous"), Some(2));
        assert_eq!(store.previous_before(1).expect("previous at bottom"), None);

        // The probe id does not have to exist.
        assert_eq!(store.next_after(0).expect("next from 0"), Some(1));
        assert_eq!(store.previous_before(100).expect("previous from 100"), Some(3));
    });
}

#[test]
fn soft_delete_hides_hard_delete_removes() {
    each_store(|store| {
        let uuid = Uuid::new_v4();
        store.write(&sample_record(1, uuid)).expect("write");

        store.delete(uuid, DeleteMode::Soft).expect("soft delete");
        assert!(!store.exists_by_sequence(1).expect("exists after soft"));

        // The raw read still reaches the tombstoned row.
        let tombstoned = store.read_by_uuid(uuid).expect("raw read");
        assert!(tombstoned.deleted);

        store.delete(uuid, DeleteMode::Hard).expect("hard delete");
        assert!(matches!(
            store.read_by_uuid(uuid),
            Err(VaultError::NotFound { .. })
        ));
        assert!(matches!(
            store.read_by_sequence(1),
            Err(VaultError::NotFound { .. })
        ));
    });
}

#[test]
fn delete_of_unknown_uuid_is_not_found() {
    each_store(|store| {
        let result = store.delete(Uuid::new_v4(), DeleteMode::Soft);
        assert!(matches!(result, Err(VaultError::NotFound { .. })));
    });
}

#[test]
fn navigation_skips_soft_deleted_rows() {
    each_store(|store| {
        let uuid_two = Uuid::new_v4();
        for (id, uuid) in [(1, Uuid::new_v4()), (2, uuid_two), (3, Uuid::new_v4())] {
            store.write(&sample_record(id, uuid)).expect("write");
        }

        store.delete(uuid_two, DeleteMode::Soft).expect("soft delete");

        assert_eq!(store.next_after(1).expect("next"), Some(3));
        assert_eq!(store.previous_before(3).expect("previous"), Some(1));
        assert_eq!(store.min_sequence().expect("min"), Some(1));
    });
}

#[test]
fn high_water_mark_survives_hard_delete_of_top_row() {
    each_store(|store| {
        let top = Uuid::new_v4();
        store.write(&sample_record(1, Uuid::new_v4())).expect("write 1");
        store.write(&sample_record(2, top)).expect("write 2");

        store.delete(top, DeleteMode::Hard).expect("hard delete");

        // The id space never shrinks: 2 stays burned.
        assert_eq!(store.max_sequence().expect("max"), Some(2));
        assert_eq!(store.min_sequence().expect("min"), Some(1));
    });
}

#[test]
fn file_store_replays_journal_on_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let uuid_one = Uuid::new_v4();
    let uuid_two = Uuid::new_v4();

    {
        let store = FileStore::open(dir.path()).expect("open");
        store.ensure_schema().expect("schema");
        store.write(&sample_record(1, uuid_one)).expect("write 1");
        store.write(&sample_record(2, uuid_two)).expect("write 2");
        store.delete(uuid_one, DeleteMode::Soft).expect("soft delete");
    }

    let reopened = FileStore::open(dir.path()).expect("reopen");
    reopened.ensure_schema().expect("schema");

    assert!(reopened.read_by_uuid(uuid_one).expect("raw read").deleted);
    assert!(!reopened.exists_by_sequence(1).expect("exists 1"));
    assert!(reopened.exists_by_sequence(2).expect("exists 2"));
    assert_eq!(reopened.max_sequence().expect("max"), Some(2));
}

#[test]
fn file_store_hard_delete_survives_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let uuid = Uuid::new_v4();

    {
        let store = FileStore::open(dir.path()).expect("open");
        store.ensure_schema().expect("schema");
        store.write(&sample_record(1, uuid)).expect("write");
        store.delete(uuid, DeleteMode::Hard).expect("hard delete");
    }

    let reopened = FileStore::open(dir.path()).expect("reopen");
    assert!(matches!(
        reopened.read_by_uuid(uuid),
        Err(VaultError::NotFound { .. })
    ));
    // The remove line still advances the high-water mark on replay.
    assert_eq!(reopened.max_sequence().expect("max"), Some(1));
}

#[test]
fn file_store_rejects_unparsable_journal() {
    let dir = TempDir::new().expect("temp dir");
    let journal = dir.path().join("records.jsonl");
    let mut file = std::fs::File::create(&journal).expect("create journal");
    writeln!(file, "this is not a journal line").expect("write garbage");

    let result = FileStore::open(dir.path());
    assert!(matches!(result, Err(VaultError::Schema { .. })));
}

#[test]
fn sled_store_persists_across_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let uuid = Uuid::new_v4();

    {
        let store = SledStore::open(dir.path()).expect("open");
        store.ensure_schema().expect("schema");
        store.write(&sample_record(1, uuid)).expect("write");
    }

    let reopened = SledStore::open(dir.path()).expect("reopen");
    reopened.ensure_schema().expect("schema accepts its own marker");
    assert_eq!(reopened.read_by_uuid(uuid).expect("read").sequence_id, 1);
    assert_eq!(reopened.max_sequence().expect("max"), Some(1));
}

#[test]
fn sled_store_refuses_unmarked_data() {
    let dir = TempDir::new().expect("temp dir");
    let store = SledStore::open(dir.path()).expect("open");

    // Rows written without the schema marker ever being set: a foreign or
    // half-initialized database, not ours to adopt.
    store
        .write(&sample_record(1, Uuid::new_v4()))
        .expect("raw write");

    let result = store.ensure_schema();
    assert!(matches!(result, Err(VaultError::Schema { .. })));
}
