//! Store payload types
//!
//! The document layer writes exactly three payload shapes into the
//! underlying store: JSON documents (ordinary documents and index entries),
//! UTF-8 string segments (large-document chunks), and 64-bit counters (the
//! store's addable value type). `Value` is the tagged union of the three.

use serde::{Deserialize, Serialize};

/// A value as stored at a single key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A JSON document: ordinary document entries, index entries, and
    /// large-document manifests
    Document(serde_json::Value),
    /// One UTF-8 chunk of a large document's serialized form
    Segment(String),
    /// The store's 64-bit counter; the only valid target of a `sum`
    /// mutation
    Counter(u64),
}

impl Value {
    /// Borrow the JSON document, if this is one
    pub fn as_document(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Consume into the JSON document, if this is one
    pub fn into_document(self) -> Option<serde_json::Value> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Borrow the segment string, if this is one
    pub fn as_segment(&self) -> Option<&str> {
        match self {
            Value::Segment(s) => Some(s),
            _ => None,
        }
    }

    /// The counter value, if this is one
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            Value::Counter(n) => Some(*n),
            _ => None,
        }
    }

    /// True for counter values
    pub fn is_counter(&self) -> bool {
        matches!(self, Value::Counter(_))
    }
}

impl From<serde_json::Value> for Value {
    fn from(doc: serde_json::Value) -> Self {
        Value::Document(doc)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Counter(n)
    }
}
