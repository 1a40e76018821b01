use sealdb_types::{Document, DocumentData, Fields, Path, Value};

#[test]
fn empty_payload_is_kept() {
    let doc = Document::new(Path::parse("/test/key1").unwrap(), Vec::new());
    assert_eq!(doc.data(), b"");
    assert!(doc.fields.is_empty());
}

#[test]
fn typed_field_accessors() {
    let mut doc = Document::new(Path::parse("/test/key1").unwrap(), b"val1".to_vec());
    doc.fields.insert("index".into(), Value::Int(1));
    doc.fields.insert("info".into(), Value::from("testinfo"));
    doc.fields.insert("blob".into(), Value::from(vec![1u8, 2]));

    assert_eq!(doc.int("index"), Some(1));
    assert_eq!(doc.string("info"), Some("testinfo"));
    assert_eq!(doc.bytes("blob"), Some(&[1u8, 2][..]));
    assert_eq!(doc.int("info"), None);
    assert_eq!(doc.string("missing"), None);
}

#[test]
fn merge_keeps_payload_without_data() {
    let mut data = b"val1".to_vec();
    let mut fields = Fields::new();
    fields.insert("a".into(), Value::Int(1));

    DocumentData::default()
        .with_field("b", 2)
        .merge_into(&mut data, &mut fields);

    assert_eq!(data, b"val1");
    assert_eq!(fields.len(), 2);
}

#[test]
fn merge_replaces_payload_with_data() {
    let mut data = b"val1".to_vec();
    let mut fields = Fields::new();
    fields.insert("a".into(), Value::Int(1));

    DocumentData::bytes("val2")
        .with_field("a", 5)
        .merge_into(&mut data, &mut fields);

    assert_eq!(data, b"val2");
    assert_eq!(fields.get("a"), Some(&Value::Int(5)));
}

#[test]
fn conversions_into_document_data() {
    assert_eq!(DocumentData::from("hi").data, Some(b"hi".to_vec()));
    assert_eq!(DocumentData::from(b"hi").data, Some(b"hi".to_vec()));
    assert_eq!(DocumentData::from(vec![1u8]).data, Some(vec![1u8]));
    assert_eq!(DocumentData::from(Fields::new()).data, None);
}
