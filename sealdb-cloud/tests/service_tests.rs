use pretty_assertions::assert_eq;
use sealdb_cloud::{CloudError, DocumentService, MemoryService, Query};
use sealdb_store::Direction;
use sealdb_types::{Fields, HybridTimestamp, TestClock, Value};
use std::sync::Arc;

fn fields(n: i64) -> Fields {
    let mut f = Fields::new();
    f.insert("n".to_string(), Value::Int(n));
    f
}

fn seeded() -> MemoryService {
    let service = MemoryService::with_clock(Arc::new(TestClock::new()));
    for id in ["a", "b", "c", "d"] {
        service.create("/col", id, fields(1)).unwrap();
    }
    service
}

fn ids(docs: Vec<sealdb_cloud::ServiceDocument>) -> Vec<String> {
    docs.into_iter().map(|d| d.id).collect()
}

#[test]
fn query_orders_and_pages() {
    let service = seeded();
    let mut query = Query::collection("/col");
    query.limit = 2;
    assert_eq!(ids(service.query(&query).unwrap()), vec!["a", "b"]);

    query.start_after = Some("b".to_string());
    assert_eq!(ids(service.query(&query).unwrap()), vec!["c", "d"]);

    let mut query = Query::collection("/col");
    query.start_at = Some("b".to_string());
    assert_eq!(ids(service.query(&query).unwrap()), vec!["b", "c", "d"]);

    let mut query = Query::collection("/col");
    query.order = Direction::Descending;
    query.start_after = Some("c".to_string());
    assert_eq!(ids(service.query(&query).unwrap()), vec!["b", "a"]);
}

#[test]
fn query_filters_by_create_time() {
    let service = seeded();
    let b = service.get("/col", "b").unwrap().unwrap();
    let mut query = Query::collection("/col");
    query.created_after = Some(b.create_time);
    assert_eq!(ids(service.query(&query).unwrap()), vec!["c", "d"]);

    let mut query = Query::collection("/col");
    query.created_before = Some(b.create_time);
    assert_eq!(ids(service.query(&query).unwrap()), vec!["a"]);

    let mut query = Query::collection("/col");
    query.created_after = Some(HybridTimestamp::now());
    assert!(service.query(&query).unwrap().is_empty());
}

#[test]
fn conflicting_cursors_are_rejected() {
    let service = seeded();
    let mut query = Query::collection("/col");
    query.start_at = Some("a".to_string());
    query.start_after = Some("a".to_string());
    assert!(matches!(
        service.query(&query),
        Err(CloudError::InvalidArgument(_))
    ));
}

#[test]
fn create_set_delete() {
    let service = seeded();
    assert!(matches!(
        service.create("/col", "a", fields(2)),
        Err(CloudError::AlreadyExists(_))
    ));

    let doc = service.set("/col", "a", fields(3), true).unwrap();
    assert_eq!(doc.fields.get("n"), Some(&Value::Int(3)));
    assert!(doc.update_time > doc.create_time);

    assert!(service.delete("/col", "a").unwrap());
    assert!(!service.delete("/col", "a").unwrap());
    assert!(!service.delete("/nothing", "a").unwrap());
}

#[test]
fn empty_collections_disappear() {
    let service = MemoryService::new();
    service.create("/one", "x", fields(1)).unwrap();
    service.create("/two", "x", fields(1)).unwrap();
    assert_eq!(service.collection_ids().unwrap(), vec!["/one", "/two"]);
    service.delete("/one", "x").unwrap();
    assert_eq!(service.collection_ids().unwrap(), vec!["/two"]);
}

#[test]
fn counters_increment_atomically() {
    let service = Arc::new(MemoryService::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    service.increment("counter", 1).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(service.increment("counter", 0).unwrap(), 800);
    assert_eq!(service.increment("other", 5).unwrap(), 5);
}
