//! Index maintenance for indexable collections
//!
//! Index entries are created and destroyed strictly together with the
//! owning document, inside the same atomic batch. A unique (primary) index
//! entry is the full document with the owning id embedded under `__id__`,
//! guarded by an absent-key check; the check is what enforces uniqueness.
//! A non-unique (secondary) index entry is the full document under a key
//! whose trailing part is the document id, so one prefix scan enumerates
//! every document sharing a field value.
//!
//! Indexes are sparse: a document without the indexed field produces no
//! entry for it.

use crate::collection::{Collection, CollectionKind};
use crate::keys::{index_value_part, key_part_from_json, key_part_to_json, CollectionKeys};
use crate::options::{ListOptions, ListResult};
use folio_core::document::Document;
use folio_core::error::{Error, Result};
use folio_core::key::{Key, KeyPart};
use folio_core::model::Model;
use folio_core::value::Value;
use folio_store::{AtomicBatch, Mutation, ScanOptions, Store};

/// Field embedded in primary-index entries to point back at the owning id
pub const ID_FIELD: &str = "__id__";

/// Append the insert fragments for one document to a batch
///
/// Always: an absent-key check plus the id-key write. For indexable
/// collections, additionally the per-field index fragments. A defined but
/// non-indexable field value (null, bool, float, object) is a validation
/// error.
pub(crate) fn append_insert(
    batch: &mut AtomicBatch,
    keys: &CollectionKeys,
    kind: &CollectionKind,
    id: &KeyPart,
    document: &serde_json::Value,
) -> Result<()> {
    let id_key = keys.id_key(id);
    batch.push_check(id_key.clone(), None);
    batch.push_mutation(id_key, Mutation::Set(Value::Document(document.clone())));

    if let CollectionKind::Indexable { primary, secondary } = kind {
        for field in primary {
            let Some(field_value) = document.get(field) else {
                continue;
            };
            let part = index_value_part(field_value)?;
            let key = keys.primary_index_key(field, &part);
            batch.push_check(key.clone(), None);
            batch.push_mutation(
                key,
                Mutation::Set(Value::Document(with_id_field(document, id)?)),
            );
        }
        for field in secondary {
            let Some(field_value) = document.get(field) else {
                continue;
            };
            let part = index_value_part(field_value)?;
            let key = keys.secondary_index_key(field, &part, id);
            // Guard against colliding with corrupted leftover state; under
            // normal operation the key is always absent.
            batch.push_check(key.clone(), None);
            batch.push_mutation(key, Mutation::Set(Value::Document(document.clone())));
        }
    }
    Ok(())
}

/// Compute the index keys a stored document occupies
///
/// Used on delete paths, where the entries to remove are derived from the
/// captured document. Unindexable field values are skipped; no entry can
/// exist for them.
pub(crate) fn index_keys(
    keys: &CollectionKeys,
    primary: &[String],
    secondary: &[String],
    id: &KeyPart,
    document: &serde_json::Value,
) -> (Vec<Key>, Vec<Key>) {
    let primary_keys = primary
        .iter()
        .filter_map(|field| {
            let part = index_value_part(document.get(field)?).ok()?;
            Some(keys.primary_index_key(field, &part))
        })
        .collect();
    let secondary_keys = secondary
        .iter()
        .filter_map(|field| {
            let part = index_value_part(document.get(field)?).ok()?;
            Some(keys.secondary_index_key(field, &part, id))
        })
        .collect();
    (primary_keys, secondary_keys)
}

/// Embed the owning id into a primary-index entry
fn with_id_field(document: &serde_json::Value, id: &KeyPart) -> Result<serde_json::Value> {
    let mut entry = document.clone();
    let map = entry.as_object_mut().ok_or_else(|| {
        Error::Validation("indexed documents must be JSON objects".into())
    })?;
    map.insert(ID_FIELD.to_string(), key_part_to_json(id));
    Ok(entry)
}

impl<T: Model> Collection<T> {
    /// Look up the document owning a unique index value
    ///
    /// The index entry is a fat pointer: it carries the full document plus
    /// the owning id, so no second fetch is needed.
    pub fn find_by_primary_index(
        &self,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<Option<Document<T>>> {
        let part = index_value_part(value)?;
        let key = self.keys().primary_index_key(field, &part);

        let entry = self.store().get(&key)?;
        let Some((stored, versionstamp)) = entry.into_parts() else {
            return Ok(None);
        };

        let corrupted = |reason: String| Error::CorruptedDocument {
            id: key.to_string(),
            reason,
        };
        let mut json = stored
            .into_document()
            .ok_or_else(|| corrupted("index entry is not a document".into()))?;
        let id_json = json
            .as_object_mut()
            .and_then(|map| map.remove(ID_FIELD))
            .ok_or_else(|| corrupted(format!("index entry lacks {}", ID_FIELD)))?;
        let id = key_part_from_json(&id_json)?;

        let value: T =
            serde_json::from_value(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Some(Document::new(id, versionstamp, value)))
    }

    /// List the documents sharing a non-unique index value, in id order
    pub fn find_by_secondary_index(
        &self,
        field: &str,
        value: &serde_json::Value,
        options: &ListOptions,
    ) -> Result<ListResult<T>> {
        let part = index_value_part(value)?;
        let prefix = self.keys().secondary_index_prefix(field, &part);
        let selector = self.bounded_selector(prefix, options);
        let scan = ScanOptions {
            limit: options.limit,
            reverse: options.reverse,
        };

        let rows = self.store().list(&selector, &scan)?;
        let cursor = rows.last().and_then(|row| row.key.last()).cloned();

        let mut documents = Vec::new();
        for row in rows {
            let id = row
                .key
                .last()
                .cloned()
                .ok_or_else(|| Error::Store(format!("malformed index key: {}", row.key)))?;
            let json = row.value.into_document().ok_or_else(|| {
                Error::CorruptedDocument {
                    id: id.to_string(),
                    reason: "index entry is not a document".into(),
                }
            })?;
            let value: T =
                serde_json::from_value(json).map_err(|e| Error::Serialization(e.to_string()))?;
            documents.push(Document::new(id, row.versionstamp, value));
        }
        Ok(ListResult { documents, cursor })
    }

    /// Count the documents sharing a non-unique index value
    pub fn count_by_secondary_index(
        &self,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<usize> {
        let part = index_value_part(value)?;
        let prefix = self.keys().secondary_index_prefix(field, &part);
        let rows = self
            .store()
            .list(&folio_store::KeySelector::prefix(prefix), &ScanOptions::new())?;
        Ok(rows.len())
    }

    /// Delete the document owning a unique index value
    ///
    /// A no-op when no document owns the value.
    pub fn delete_by_primary_index(
        &self,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        match self.find_by_primary_index(field, value)? {
            Some(document) => self.delete_one(&document.id),
            None => Ok(()),
        }
    }
}
