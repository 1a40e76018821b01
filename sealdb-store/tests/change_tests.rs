use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sealdb_store::{
    Change, Direction, DocumentStore, MemStore, SetOptions, StoreError, changes_from_iterator,
};
use sealdb_types::{Clock, HybridTimestamp, SystemClock, TestClock};
use std::sync::Arc;

fn read(
    store: &MemStore,
    since: HybridTimestamp,
    limit: usize,
    direction: Direction,
) -> (Vec<Change>, HybridTimestamp) {
    let mut iter = store.changes("/test/changes", since, limit, direction).unwrap();
    changes_from_iterator(&mut iter, since).unwrap()
}

fn values(changes: &[Change]) -> Vec<String> {
    changes.iter().map(Change::data_lossy).collect()
}

fn forty_values() -> MemStore {
    let store = MemStore::with_clock(Arc::new(TestClock::new()));
    for i in 0..40 {
        store
            .change_add("/test/changes", vec![format!("value{i}").into_bytes()])
            .unwrap();
    }
    store
}

#[test]
fn change_add_assigns_sequential_paths() {
    let store = MemStore::new();
    let paths = store
        .change_add("/test/changes", vec![b"a".to_vec(), b"b".to_vec()])
        .unwrap();
    let more = store.change_add("/test/changes", vec![b"c".to_vec()]).unwrap();
    let got: Vec<_> = paths.iter().chain(&more).map(ToString::to_string).collect();
    assert_eq!(
        got,
        vec![
            "/test/changes/000000000000001",
            "/test/changes/000000000000002",
            "/test/changes/000000000000003",
        ]
    );
    let (changes, _) = read(&store, HybridTimestamp::ZERO, 0, Direction::Ascending);
    let indices: Vec<_> = changes.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

#[test]
fn change_add_needs_a_collection() {
    let store = MemStore::new();
    assert!(matches!(
        store.change_add("/test", vec![b"x".to_vec()]),
        Err(StoreError::InvalidPath(_))
    ));
}

#[test]
fn forty_value_scenario() {
    let store = forty_values();

    let (page1, cursor) = read(&store, HybridTimestamp::ZERO, 10, Direction::Ascending);
    let expected: Vec<_> = (0..10).map(|i| format!("value{i}")).collect();
    assert_eq!(values(&page1), expected);
    assert_eq!(cursor, page1[9].timestamp);

    let (page2, _) = read(&store, cursor, 10, Direction::Ascending);
    let expected: Vec<_> = (10..20).map(|i| format!("value{i}")).collect();
    assert_eq!(values(&page2), expected);

    let (desc1, cursor) = read(&store, HybridTimestamp::ZERO, 10, Direction::Descending);
    let expected: Vec<_> = (30..40).rev().map(|i| format!("value{i}")).collect();
    assert_eq!(values(&desc1), expected);

    let (desc2, _) = read(&store, cursor, 5, Direction::Descending);
    let expected: Vec<_> = (25..30).rev().map(|i| format!("value{i}")).collect();
    assert_eq!(values(&desc2), expected);
}

#[test]
fn empty_read_echoes_cursor() {
    let store = forty_values();
    let now = SystemClock::new().now();
    let (changes, cursor) = read(&store, now, 10, Direction::Ascending);
    assert!(changes.is_empty());
    assert_eq!(cursor, now);

    let (_, last) = read(&store, HybridTimestamp::ZERO, 0, Direction::Ascending);
    let (changes, cursor) = read(&store, last, 10, Direction::Ascending);
    assert!(changes.is_empty());
    assert_eq!(cursor, last);
}

#[test]
fn change_records_are_documents() {
    let store = forty_values();
    let doc = store.get("/test/changes/000000000000001").unwrap().unwrap();
    assert_eq!(doc.data(), b"value0");
    store
        .set("/test/other", "not a change".into(), SetOptions::default())
        .unwrap();
    let (all, _) = read(&store, HybridTimestamp::ZERO, 0, Direction::Ascending);
    assert_eq!(all.len(), 40);
}

proptest! {
    #[test]
    fn pages_neither_overlap_nor_skip(count in 0usize..30, limit in 1usize..8, descending in any::<bool>()) {
        let store = MemStore::with_clock(Arc::new(TestClock::new()));
        let batch: Vec<Vec<u8>> = (0..count).map(|i| format!("value{i}").into_bytes()).collect();
        store.change_add("/test/changes", batch).unwrap();

        let direction = if descending { Direction::Descending } else { Direction::Ascending };
        let mut seen = Vec::new();
        let mut cursor = HybridTimestamp::ZERO;
        loop {
            let (page, next) = read(&store, cursor, limit, direction);
            prop_assert!(page.len() <= limit);
            if page.is_empty() {
                prop_assert_eq!(next, cursor);
                break;
            }
            for pair in page.windows(2) {
                if descending {
                    prop_assert!(pair[0].timestamp > pair[1].timestamp);
                } else {
                    prop_assert!(pair[0].timestamp < pair[1].timestamp);
                }
            }
            seen.extend(page.into_iter().map(|c| c.index));
            cursor = next;
        }

        let mut expected: Vec<u64> = (1..=count as u64).collect();
        if descending {
            expected.reverse();
        }
        prop_assert_eq!(seen, expected);
    }
}
