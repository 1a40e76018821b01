use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sealdb_crypto::SecretKey;
use sealdb_engine::{Engine, EngineConfig};
use sealdb_store::{
    Change, Direction, DocumentStore, IterOptions, SetOptions, changes_from_iterator,
};
use sealdb_types::{HybridTimestamp, TestClock};
use std::sync::Arc;

fn engine() -> Engine {
    let config = EngineConfig {
        page_size: 7,
        ..EngineConfig::default()
    };
    Engine::open_in_memory_with_config(SecretKey::from_bytes([9; 32]), config)
        .unwrap()
        .with_clock(Arc::new(TestClock::new()))
}

fn read(
    engine: &Engine,
    since: HybridTimestamp,
    limit: usize,
    direction: Direction,
) -> (Vec<Change>, HybridTimestamp) {
    let mut iter = engine.changes("/test/changes", since, limit, direction).unwrap();
    changes_from_iterator(&mut iter, since).unwrap()
}

fn values(changes: &[Change]) -> Vec<String> {
    changes.iter().map(Change::data_lossy).collect()
}

#[test]
fn forty_value_scenario() {
    let engine = engine();
    for i in 0..40 {
        engine
            .change_add("/test/changes", vec![format!("value{i}").into_bytes()])
            .unwrap();
    }

    let (page1, cursor) = read(&engine, HybridTimestamp::ZERO, 10, Direction::Ascending);
    assert_eq!(values(&page1), (0..10).map(|i| format!("value{i}")).collect::<Vec<_>>());
    let (page2, _) = read(&engine, cursor, 10, Direction::Ascending);
    assert_eq!(values(&page2), (10..20).map(|i| format!("value{i}")).collect::<Vec<_>>());

    let (desc1, cursor) = read(&engine, HybridTimestamp::ZERO, 10, Direction::Descending);
    assert_eq!(
        values(&desc1),
        (30..40).rev().map(|i| format!("value{i}")).collect::<Vec<_>>()
    );
    let (desc2, _) = read(&engine, cursor, 5, Direction::Descending);
    assert_eq!(
        values(&desc2),
        (25..30).rev().map(|i| format!("value{i}")).collect::<Vec<_>>()
    );
}

#[test]
fn batch_append_is_sequential() {
    let engine = engine();
    let paths = engine
        .change_add("/test/changes", vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()])
        .unwrap();
    let paths: Vec<_> = paths.iter().map(ToString::to_string).collect();
    assert_eq!(
        paths,
        vec![
            "/test/changes/000000000000001",
            "/test/changes/000000000000002",
            "/test/changes/000000000000003",
        ]
    );
    let (all, _) = read(&engine, HybridTimestamp::ZERO, 0, Direction::Ascending);
    for pair in all.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
}

#[test]
fn empty_read_echoes_cursor() {
    let engine = engine();
    engine.change_add("/test/changes", vec![b"x".to_vec()]).unwrap();
    let now = HybridTimestamp::now();
    let (changes, cursor) = read(&engine, now, 10, Direction::Ascending);
    assert!(changes.is_empty());
    assert_eq!(cursor, now);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ascending_paths_strictly_increase(keys in prop::collection::btree_set("[a-z0-9]{1,8}", 0..40)) {
        let engine = engine();
        let mut shuffled: Vec<_> = keys.iter().cloned().collect();
        shuffled.reverse();
        for key in &shuffled {
            engine.set(&format!("/col/{key}"), key.as_str().into(), SetOptions::default()).unwrap();
        }
        let docs = engine.documents("/col", IterOptions::new()).unwrap();
        for pair in docs.windows(2) {
            prop_assert!(pair[0].path < pair[1].path);
        }
        prop_assert_eq!(docs.len(), keys.len());
    }

    #[test]
    fn roundtrips_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let engine = engine();
        engine.set("/test/key", data.clone().into(), SetOptions::default()).unwrap();
        prop_assert_eq!(engine.get("/test/key").unwrap().unwrap().data, data);
    }
}
