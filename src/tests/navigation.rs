// Navigation over the live id space: boundary behavior, tombstone
// skipping, and the adjacency round trip.

use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use crate::lifecycle::RecordLifecycle;
use crate::log_record::{DeleteMode, RecordDraft};
use crate::navigation::Navigation;
use crate::record_store::RecordStore;
use crate::record_store_file::FileStore;

struct Fixture {
    lifecycle: RecordLifecycle,
    navigation: Navigation,
    _dir: TempDir,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().expect("temp dir");
    let store = FileStore::open(dir.path()).expect("open store");
    store.ensure_schema().expect("schema");
    let store: Arc<dyn RecordStore> = Arc::new(store);
    Fixture {
        lifecycle: RecordLifecycle::new(store.clone()),
        navigation: Navigation::new(store),
        _dir: dir,
    }
}

fn entry(notes: &str) -> RecordDraft {
    RecordDraft {
        notes: Some(notes.to_string()),
        source: Some("svc-a".to_string()),
        level: Some("INFO".to_string()),
        status: Some("new".to_string()),
        misc: None,
    }
}

/// Create `count` records and return their uuids, indexed by sequence id.
fn seed(fixture: &Fixture, count: u64) -> Vec<Uuid> {
    (1..=count)
        .map(|id| {
            let (sequence_id, uuid) = fixture
                .lifecycle
                .create(&entry(&format!("entry {id}")))
                .expect("create");
            assert_eq!(sequence_id, id);
            uuid
        })
        .collect()
}

#[test]
fn empty_store_has_no_boundaries_to_walk() {
    let fx = fixture();

    assert_eq!(fx.navigation.first().expect("first"), None);
    assert_eq!(fx.navigation.new_id().expect("new_id"), 1);
    assert_eq!(fx.navigation.next(1).expect("next"), None);
    assert_eq!(fx.navigation.previous(1).expect("previous"), None);
    assert!(!fx.navigation.exists(1).expect("exists"));
}

#[test]
fn adjacent_navigation_on_two_records() {
    let fx = fixture();
    seed(&fx, 2);

    assert_eq!(fx.navigation.first().expect("first"), Some(1));
    assert_eq!(fx.navigation.new_id().expect("new_id"), 3);
    assert_eq!(fx.navigation.next(1).expect("next of 1"), Some(2));
    assert_eq!(fx.navigation.previous(2).expect("previous of 2"), Some(1));

    // Past either end: an explicit "none", never a wrap and never an
    // error.
    assert_eq!(fx.navigation.next(2).expect("next of 2"), None);
    assert_eq!(fx.navigation.previous(1).expect("previous of 1"), None);
}

#[test]
fn next_of_previous_returns_to_the_start() {
    let fx = fixture();
    seed(&fx, 5);

    for id in 2..=5 {
        let previous = fx
            .navigation
            .previous(id)
            .expect("previous")
            .expect("defined below 5");
        assert_eq!(fx.navigation.next(previous).expect("next"), Some(id));
    }
}

#[test]
fn navigation_skips_soft_deleted_records() {
    let fx = fixture();
    let uuids = seed(&fx, 3);

    fx.lifecycle
        .delete(2, uuids[1], DeleteMode::Soft)
        .expect("soft delete 2");

    assert!(!fx.navigation.exists(2).expect("exists 2"));
    assert_eq!(fx.navigation.next(1).expect("next of 1"), Some(3));
    assert_eq!(fx.navigation.previous(3).expect("previous of 3"), Some(1));

    fx.lifecycle
        .delete(1, uuids[0], DeleteMode::Soft)
        .expect("soft delete 1");
    assert_eq!(fx.navigation.first().expect("first"), Some(3));
}

#[test]
fn probe_id_need_not_exist() {
    let fx = fixture();
    let uuids = seed(&fx, 3);

    // Hard-delete the middle record so id 2 is a real gap.
    fx.lifecycle
        .delete(2, uuids[1], DeleteMode::Hard)
        .expect("hard delete 2");

    assert_eq!(fx.navigation.next(2).expect("next of gap"), Some(3));
    assert_eq!(fx.navigation.previous(2).expect("previous of gap"), Some(1));
    assert_eq!(fx.navigation.next(0).expect("next of 0"), Some(1));
    assert_eq!(fx.navigation.previous(100).expect("previous of 100"), Some(3));
}

#[test]
fn new_id_never_reuses_a_hard_deleted_id() {
    let fx = fixture();
    let uuids = seed(&fx, 2);

    fx.lifecycle
        .delete(2, uuids[1], DeleteMode::Hard)
        .expect("hard delete top record");

    // 2 is gone from the live space but stays burned.
    assert!(!fx.navigation.exists(2).expect("exists"));
    assert_eq!(fx.navigation.new_id().expect("new_id"), 3);

    let (sequence_id, _) = fx.lifecycle.create(&entry("after gap")).expect("create");
    assert_eq!(sequence_id, 3);
}
