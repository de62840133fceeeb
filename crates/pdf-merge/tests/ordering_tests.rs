mod common;

use common::source;
use pdf_merge::*;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

fn names(store: &OrderingStore) -> Vec<String> {
    store.items().iter().map(|i| i.name().to_string()).collect()
}

fn store_with(labels: &[&str]) -> (OrderingStore, Vec<ItemId>) {
    let mut store = OrderingStore::local();
    let ids = store.add_files(labels.iter().map(|l| source(l, 1)).collect());
    (store, ids)
}

#[test]
fn test_add_appends_in_order_with_unique_ids() {
    let (store, ids) = store_with(&["A", "B", "C"]);
    assert_eq!(names(&store), vec!["A.pdf", "B.pdf", "C.pdf"]);
    assert_eq!(ids.len(), 3);
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
}

#[test]
fn test_remove_unknown_is_noop() {
    let (mut store, _) = store_with(&["A", "B"]);
    assert!(store.remove(ItemId(999)).is_none());
    assert_eq!(store.len(), 2);
}

#[test]
fn test_remove_returns_item() {
    let (mut store, ids) = store_with(&["A", "B", "C"]);
    let removed = store.remove(ids[1]).unwrap();
    assert_eq!(removed.name(), "B.pdf");
    assert_eq!(names(&store), vec!["A.pdf", "C.pdf"]);
}

#[test]
fn test_move_is_clamped_at_both_ends() {
    let (mut store, ids) = store_with(&["A", "B", "C"]);

    assert!(!store.move_item(ids[0], Direction::Up));
    assert!(!store.move_item(ids[2], Direction::Down));
    assert_eq!(names(&store), vec!["A.pdf", "B.pdf", "C.pdf"]);
}

#[test]
fn test_move_single_step() {
    let (mut store, ids) = store_with(&["A", "B", "C"]);

    assert!(store.move_item(ids[0], Direction::Down));
    assert_eq!(names(&store), vec!["B.pdf", "A.pdf", "C.pdf"]);

    assert!(store.move_item(ids[2], Direction::Up));
    assert_eq!(names(&store), vec!["B.pdf", "C.pdf", "A.pdf"]);
}

#[test]
fn test_reorder_during_drag_takes_target_position() {
    let (mut store, ids) = store_with(&["A", "B", "C", "D"]);

    // Dragging D over A puts D first
    assert!(store.reorder_during_drag(ids[3], ids[0]));
    assert_eq!(names(&store), vec!["D.pdf", "A.pdf", "B.pdf", "C.pdf"]);

    // Continuing the drag over C moves D to C's current index
    assert!(store.reorder_during_drag(ids[3], ids[2]));
    assert_eq!(names(&store), vec!["A.pdf", "B.pdf", "C.pdf", "D.pdf"]);
}

#[test]
fn test_reorder_onto_self_is_noop() {
    let (mut store, ids) = store_with(&["A", "B"]);
    assert!(!store.reorder_during_drag(ids[0], ids[0]));
    assert!(!store.reorder_during_drag(ids[0], ItemId(42)));
    assert_eq!(names(&store), vec!["A.pdf", "B.pdf"]);
}

#[test]
fn test_clear_returns_removed_ids() {
    let (mut store, ids) = store_with(&["A", "B"]);
    assert_eq!(store.clear(), ids);
    assert!(store.is_empty());
}

#[derive(Clone, Default)]
struct RecordingOwner {
    proposals: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ListOwner for RecordingOwner {
    fn propose(&mut self, files: Vec<SourceFile>) {
        self.proposals
            .lock()
            .unwrap()
            .push(files.into_iter().map(|f| f.name).collect());
    }
}

#[test]
fn test_delegated_mode_proposes_instead_of_mutating() {
    let owner = RecordingOwner::default();
    let proposals = owner.proposals.clone();
    let mut store = OrderingStore::delegated(owner);

    assert!(store.add_files(vec![source("A", 1), source("B", 1)]).is_empty());
    assert!(store.is_empty());
    assert_eq!(
        proposals.lock().unwrap().last().unwrap(),
        &vec!["A.pdf".to_string(), "B.pdf".to_string()]
    );

    // The owner accepts the proposal
    store.sync(vec![source("A", 1), source("B", 1)]);
    assert_eq!(names(&store), vec!["A.pdf", "B.pdf"]);

    let b = store.items()[1].id;
    assert!(store.move_item(b, Direction::Up));
    assert_eq!(names(&store), vec!["A.pdf", "B.pdf"]);
    assert_eq!(
        proposals.lock().unwrap().last().unwrap(),
        &vec!["B.pdf".to_string(), "A.pdf".to_string()]
    );

    let a = store.items()[0].id;
    assert!(store.remove(a).is_some());
    assert_eq!(store.len(), 2);
    assert_eq!(
        proposals.lock().unwrap().last().unwrap(),
        &vec!["B.pdf".to_string()]
    );
}

#[test]
fn test_sync_with_equal_list_is_noop() {
    let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let files = vec![
        source("A", 1).with_modified(modified),
        source("B", 2).with_modified(modified),
    ];

    let mut store = OrderingStore::local();
    let first = store.sync(files.clone());
    assert!(first.changed);
    let ids = store.ids();

    let second = store.sync(files);
    assert_eq!(second, SyncOutcome::default());
    assert_eq!(store.ids(), ids);
}

#[test]
fn test_sync_detects_changed_modification_time() {
    let t1 = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
    let t2 = SystemTime::UNIX_EPOCH + Duration::from_secs(20);

    let mut store = OrderingStore::local();
    store.sync(vec![source("A", 1).with_modified(t1)]);
    let old = store.ids()[0];

    let outcome = store.sync(vec![source("A", 1).with_modified(t2)]);
    assert!(outcome.changed);
    assert_eq!(outcome.removed, vec![old]);
    assert_eq!(outcome.added.len(), 1);
    assert_ne!(store.ids()[0], old);
}

#[test]
fn test_sync_reorder_keeps_ids() {
    let mut store = OrderingStore::local();
    store.sync(vec![source("A", 1), source("B", 1), source("C", 1)]);
    let before = store.ids();

    let outcome = store.sync(vec![source("C", 1), source("A", 1), source("B", 1)]);
    assert!(outcome.changed);
    assert!(outcome.added.is_empty());
    assert!(outcome.removed.is_empty());
    assert_eq!(store.ids(), vec![before[2], before[0], before[1]]);
}
