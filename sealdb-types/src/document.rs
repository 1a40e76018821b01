//! Documents, the values written to them, and collections.

use crate::{HybridTimestamp, Path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed structured field stored alongside a document's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// Structured fields keyed by name, kept in name order.
pub type Fields = BTreeMap<String, Value>;

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Canonical document path.
    pub path: Path,
    /// Raw payload. Empty is a valid payload, distinct from a missing document.
    pub data: Vec<u8>,
    /// Structured fields merged alongside the payload.
    pub fields: Fields,
    /// Stamped at first write and never changed.
    pub created_at: HybridTimestamp,
    /// Stamped on every write.
    pub updated_at: HybridTimestamp,
}

impl Document {
    /// Creates a document with the given payload and zero timestamps.
    pub fn new(path: Path, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path,
            data: data.into(),
            fields: Fields::new(),
            created_at: HybridTimestamp::ZERO,
            updated_at: HybridTimestamp::ZERO,
        }
    }

    /// Returns the payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the payload as text, replacing invalid UTF-8.
    pub fn data_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Returns a field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns an integer field.
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.fields.get(name) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a string field.
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(Value::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns a bytes field.
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        match self.fields.get(name) {
            Some(Value::Bytes(v)) => Some(v.as_slice()),
            _ => None,
        }
    }
}

/// What a `create` or `set` writes.
///
/// `data: None` means the write carries no payload: a merging `set` keeps the
/// existing payload, anything else stores an empty one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentData {
    pub data: Option<Vec<u8>>,
    pub fields: Fields,
}

impl DocumentData {
    /// Payload only.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
            fields: Fields::new(),
        }
    }

    /// Fields only.
    pub fn fields(fields: Fields) -> Self {
        Self { data: None, fields }
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Merges this write into an existing document's payload and fields.
    pub fn merge_into(self, data: &mut Vec<u8>, fields: &mut Fields) {
        if let Some(new_data) = self.data {
            *data = new_data;
        }
        fields.extend(self.fields);
    }
}

impl From<Vec<u8>> for DocumentData {
    fn from(data: Vec<u8>) -> Self {
        Self::bytes(data)
    }
}

impl From<&[u8]> for DocumentData {
    fn from(data: &[u8]) -> Self {
        Self::bytes(data)
    }
}

impl<const N: usize> From<&[u8; N]> for DocumentData {
    fn from(data: &[u8; N]) -> Self {
        Self::bytes(data.as_slice())
    }
}

impl From<&str> for DocumentData {
    fn from(data: &str) -> Self {
        Self::bytes(data.as_bytes())
    }
}

impl From<String> for DocumentData {
    fn from(data: String) -> Self {
        Self::bytes(data.into_bytes())
    }
}

impl From<Fields> for DocumentData {
    fn from(fields: Fields) -> Self {
        Self::fields(fields)
    }
}

/// A collection: a view over the documents below a path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Collection {
    pub path: Path,
}
