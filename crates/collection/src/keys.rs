//! Collection key namespace
//!
//! Every collection owns four sub-namespaces under its base path: `id` for
//! canonical document entries, `segment` for large-document chunks,
//! `primary_index` for unique index entries and `secondary_index` for
//! non-unique ones. `CollectionKeys` precomputes the prefixes and builds
//! full keys from document ids, segment indices and indexed field values.

use folio_core::error::{Error, Result};
use folio_core::key::{
    Key, KeyPart, ID_SEGMENT, PRIMARY_INDEX_SEGMENT, SECONDARY_INDEX_SEGMENT, SEGMENT_SEGMENT,
};

/// Precomputed key prefixes for one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionKeys {
    base: Key,
    id: Key,
    segment: Key,
    primary_index: Key,
    secondary_index: Key,
}

impl CollectionKeys {
    /// Build the namespace for a collection rooted at `path`
    ///
    /// # Errors
    ///
    /// Rejects empty paths and empty path segments.
    pub fn new(path: &[&str]) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::InvalidOperation(
                "collection path cannot be empty".into(),
            ));
        }
        if path.iter().any(|segment| segment.is_empty()) {
            return Err(Error::InvalidOperation(
                "collection path segments cannot be empty".into(),
            ));
        }

        let base = Key::root().extend(path.iter().copied());
        Ok(Self {
            id: base.push(ID_SEGMENT),
            segment: base.push(SEGMENT_SEGMENT),
            primary_index: base.push(PRIMARY_INDEX_SEGMENT),
            secondary_index: base.push(SECONDARY_INDEX_SEGMENT),
            base,
        })
    }

    /// The collection's base key; equality of base keys is collection
    /// identity for the overlap rule
    pub fn base(&self) -> &Key {
        &self.base
    }

    /// Prefix of all canonical document entries
    pub fn id_prefix(&self) -> &Key {
        &self.id
    }

    /// Canonical entry key for a document
    pub fn id_key(&self, id: &KeyPart) -> Key {
        self.id.push(id.clone())
    }

    /// Prefix of all segments of one large document
    pub fn segment_prefix(&self, id: &KeyPart) -> Key {
        self.segment.push(id.clone())
    }

    /// Key of one large-document segment
    pub fn segment_key(&self, id: &KeyPart, index: u32) -> Key {
        self.segment_prefix(id).push(index)
    }

    /// Unique index entry key for a field value
    pub fn primary_index_key(&self, field: &str, value: &KeyPart) -> Key {
        self.primary_index.push(field).push(value.clone())
    }

    /// Prefix of all non-unique index entries for a field value
    pub fn secondary_index_prefix(&self, field: &str, value: &KeyPart) -> Key {
        self.secondary_index.push(field).push(value.clone())
    }

    /// Non-unique index entry key for a field value and document
    pub fn secondary_index_key(&self, field: &str, value: &KeyPart, id: &KeyPart) -> Key {
        self.secondary_index_prefix(field, value).push(id.clone())
    }
}

/// Map an indexed field value to a key part
///
/// Only strings and integral numbers are valid index key material; any
/// other *defined* value is a validation error at write time.
pub fn index_value_part(value: &serde_json::Value) -> Result<KeyPart> {
    match value {
        serde_json::Value::String(s) => Ok(KeyPart::String(s.clone())),
        serde_json::Value::Number(n) => n.as_i64().map(KeyPart::Int).ok_or_else(|| {
            Error::Validation(format!("index value {} is not an integral number", n))
        }),
        other => Err(Error::Validation(format!(
            "index value {} cannot be used as a key part",
            other
        ))),
    }
}

/// Render a key part as a JSON value (for the embedded `__id__` field)
pub fn key_part_to_json(part: &KeyPart) -> serde_json::Value {
    match part {
        KeyPart::String(s) => serde_json::Value::String(s.clone()),
        KeyPart::Int(n) => serde_json::Value::from(*n),
        KeyPart::Bytes(bytes) => serde_json::Value::from(bytes.clone()),
    }
}

/// Recover a key part from its JSON rendering
pub fn key_part_from_json(value: &serde_json::Value) -> Result<KeyPart> {
    match value {
        serde_json::Value::String(s) => Ok(KeyPart::String(s.clone())),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(KeyPart::Int)
            .ok_or_else(|| Error::Validation(format!("{} is not an integral number", n))),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| Error::Validation("byte id holds a non-byte element".into()))
            })
            .collect::<Result<Vec<u8>>>()
            .map(KeyPart::Bytes),
        other => Err(Error::Validation(format!(
            "{} cannot be recovered as a key part",
            other
        ))),
    }
}
