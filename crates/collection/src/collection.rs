//! Collections of documents over a shared store
//!
//! A collection is a stateless facade over an `Arc<dyn Store>`: it holds
//! its key namespace, its kind and its options, and nothing else. The kind
//! is a sum type: ordinary collections, indexable collections that
//! maintain unique and non-unique secondary indexes, and large collections
//! that shard serialized documents across segments. Every path that
//! cares dispatches by `match`.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::codec::DocumentCodec;
use crate::indexable;
use crate::keys::CollectionKeys;
use crate::options::{CollectionOptions, IndexKind, ListOptions, ListResult, SetOptions};
use folio_core::document::Document;
use folio_core::error::{Error, Result};
use folio_core::key::{Key, KeyPart};
use folio_core::model::{generate_id, IdGenerator, Model};
use folio_core::outcome::{CommitOutcome, WriteOutcome};
use folio_core::value::Value;
use folio_store::{AtomicBatch, CommittedEntry, KeySelector, ScanOptions, Store};

/// Storage shape of a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionKind {
    /// Ordinary single-key documents
    Plain,
    /// Single-key documents with synchronously maintained indexes
    Indexable {
        /// Fields with a unique index
        primary: Vec<String>,
        /// Fields with a non-unique index
        secondary: Vec<String>,
    },
    /// Documents whose serialized form is sharded across segments
    Large,
}

/// A collection of documents of type `T`
///
/// # Examples
///
/// ```
/// use folio_collection::{Collection, CollectionOptions};
/// use folio_core::Model;
/// use folio_store::MemoryStore;
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Note {
///     text: String,
/// }
/// impl Model for Note {}
///
/// let store = Arc::new(MemoryStore::new());
/// let notes: Collection<Note> =
///     Collection::new(store, &["notes"], CollectionOptions::new()).unwrap();
///
/// let outcome = notes.add(&Note { text: "hello".into() }).unwrap();
/// let id = outcome.id().unwrap().clone();
/// assert_eq!(notes.find(&id).unwrap().unwrap().value.text, "hello");
/// ```
pub struct Collection<T: Model> {
    store: Arc<dyn Store>,
    keys: CollectionKeys,
    kind: CollectionKind,
    id_generator: Option<IdGenerator<T>>,
    codec: Arc<dyn DocumentCodec>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Model> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("base", self.keys.base())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T: Model> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
            kind: self.kind.clone(),
            id_generator: self.id_generator,
            codec: Arc::clone(&self.codec),
            _marker: PhantomData,
        }
    }
}

impl<T: Model> Collection<T> {
    /// Create a collection rooted at `path` over the given store
    ///
    /// # Errors
    ///
    /// Rejects empty paths and large collections with declared indices
    /// (large documents have no single entry for index fragments to ride).
    pub fn new(
        store: Arc<dyn Store>,
        path: &[&str],
        options: CollectionOptions<T>,
    ) -> Result<Self> {
        let keys = CollectionKeys::new(path)?;

        if options.large && !options.indices.is_empty() {
            return Err(Error::InvalidOperation(
                "large collections cannot declare indices".into(),
            ));
        }

        let kind = if options.large {
            CollectionKind::Large
        } else if options.indices.is_empty() {
            CollectionKind::Plain
        } else {
            let mut primary = Vec::new();
            let mut secondary = Vec::new();
            for (field, index_kind) in &options.indices {
                match index_kind {
                    IndexKind::Primary => primary.push(field.clone()),
                    IndexKind::Secondary => secondary.push(field.clone()),
                }
            }
            CollectionKind::Indexable { primary, secondary }
        };

        Ok(Self {
            store,
            keys,
            kind,
            id_generator: options.id_generator,
            codec: options.codec,
            _marker: PhantomData,
        })
    }

    /// The collection's key namespace
    pub fn keys(&self) -> &CollectionKeys {
        &self.keys
    }

    /// The collection's storage shape
    pub fn kind(&self) -> &CollectionKind {
        &self.kind
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub(crate) fn codec(&self) -> &Arc<dyn DocumentCodec> {
        &self.codec
    }

    pub(crate) fn generate_doc_id(&self, value: &T) -> KeyPart {
        match self.id_generator {
            Some(generator) => generator(value),
            None => generate_id(),
        }
    }

    /// Validate and normalize a candidate value
    ///
    /// Returns the normalized value together with its JSON form, which is
    /// what gets stored.
    pub(crate) fn parse_value(&self, value: &T) -> Result<(T, serde_json::Value)> {
        let candidate = serde_json::to_value(value)?;
        let parsed = T::parse(candidate)?;
        let document = serde_json::to_value(&parsed)?;
        Ok((parsed, document))
    }

    fn decode_value(&self, id: &KeyPart, value: Value) -> Result<T> {
        match value {
            Value::Document(json) => {
                serde_json::from_value(json).map_err(|e| Error::Serialization(e.to_string()))
            }
            Value::Counter(n) => serde_json::from_value(serde_json::Value::from(n))
                .map_err(|e| Error::Serialization(e.to_string())),
            Value::Segment(_) => Err(Error::CorruptedDocument {
                id: id.to_string(),
                reason: "segment payload stored at id key".into(),
            }),
        }
    }

    // ========== Reads ==========

    /// Fetch one document by id
    pub fn find(&self, id: &KeyPart) -> Result<Option<Document<T>>> {
        if self.kind == CollectionKind::Large {
            return self.large_find(id);
        }

        let entry = self.store.get(&self.keys.id_key(id))?;
        match entry.into_parts() {
            Some((value, versionstamp)) => {
                let value = self.decode_value(id, value)?;
                Ok(Some(Document::new(id.clone(), versionstamp, value)))
            }
            None => Ok(None),
        }
    }

    /// Fetch several documents by id, preserving input order
    ///
    /// Missing ids are skipped.
    pub fn find_many(&self, ids: &[KeyPart]) -> Result<Vec<Document<T>>> {
        if self.kind == CollectionKind::Large {
            let mut documents = Vec::new();
            for id in ids {
                if let Some(doc) = self.large_find(id)? {
                    documents.push(doc);
                }
            }
            return Ok(documents);
        }

        let keys: Vec<Key> = ids.iter().map(|id| self.keys.id_key(id)).collect();
        let entries = self.store.get_many(&keys)?;
        let mut documents = Vec::new();
        for (id, entry) in ids.iter().zip(entries) {
            if let Some((value, versionstamp)) = entry.into_parts() {
                let value = self.decode_value(id, value)?;
                documents.push(Document::new(id.clone(), versionstamp, value));
            }
        }
        Ok(documents)
    }

    // ========== Prefix iteration ==========

    /// Build a selector over a prefix from id-level bounds
    pub(crate) fn bounded_selector(&self, prefix: Key, options: &ListOptions) -> KeySelector {
        let mut start = options.start_id.as_ref().map(|id| prefix.push(id.clone()));
        let mut end = options.end_id.as_ref().map(|id| prefix.push(id.clone()));

        if let Some(id_prefix) = &options.prefix {
            let low = prefix.push(KeyPart::String(id_prefix.clone()));
            let high = prefix.push(KeyPart::String(format!("{}{}", id_prefix, char::MAX)));
            start = Some(match start {
                Some(s) if s > low => s,
                _ => low,
            });
            end = Some(match end {
                Some(e) if e < high => e,
                _ => high,
            });
        }

        if let Some(cursor) = &options.cursor {
            let cursor_key = prefix.push(cursor.clone());
            if options.reverse {
                end = Some(match end {
                    Some(e) if e < cursor_key => e,
                    _ => cursor_key,
                });
            } else {
                let after = cursor_key.successor();
                start = Some(match start {
                    Some(s) if s > after => s,
                    _ => after,
                });
            }
        }

        let mut selector = KeySelector::prefix(prefix);
        if let Some(start) = start {
            selector = selector.with_start(start);
        }
        if let Some(end) = end {
            selector = selector.with_end(end);
        }
        selector
    }

    pub(crate) fn scan_ids(&self, options: &ListOptions) -> Result<Vec<CommittedEntry>> {
        let selector = self.bounded_selector(self.keys.id_prefix().clone(), options);
        let scan = ScanOptions {
            limit: options.limit,
            reverse: options.reverse,
        };
        self.store.list(&selector, &scan)
    }

    fn materialize_row(&self, row: CommittedEntry) -> Result<Document<T>> {
        let id = row
            .key
            .trailing_id()
            .cloned()
            .ok_or_else(|| Error::Store(format!("malformed id key: {}", row.key)))?;
        match self.kind {
            CollectionKind::Large => self.assemble_document(&id, row.value, row.versionstamp),
            _ => {
                let value = self.decode_value(&id, row.value)?;
                Ok(Document::new(id, row.versionstamp, value))
            }
        }
    }

    /// List documents in id order
    ///
    /// The cursor in the result is the last scanned id; feed it back via
    /// `ListOptions::with_cursor` to resume.
    pub fn list(&self, options: &ListOptions) -> Result<ListResult<T>> {
        self.list_filtered(options, |_| true)
    }

    /// List documents in id order, keeping those the filter accepts
    ///
    /// The filter runs after each document is materialized, so a page may
    /// hold fewer documents than `options.limit` scanned entries.
    pub fn list_filtered(
        &self,
        options: &ListOptions,
        filter: impl Fn(&Document<T>) -> bool,
    ) -> Result<ListResult<T>> {
        let rows = self.scan_ids(options)?;
        let cursor = rows.last().and_then(|row| row.key.trailing_id()).cloned();

        let mut documents = Vec::new();
        for row in rows {
            let document = self.materialize_row(row)?;
            if filter(&document) {
                documents.push(document);
            }
        }
        Ok(ListResult { documents, cursor })
    }

    /// Count documents matching the listing bounds
    pub fn count(&self, options: &ListOptions) -> Result<usize> {
        Ok(self.scan_ids(options)?.len())
    }

    /// Visit every document matching the listing bounds
    pub fn for_each(&self, options: &ListOptions, mut f: impl FnMut(Document<T>)) -> Result<()> {
        for row in self.scan_ids(options)? {
            f(self.materialize_row(row)?);
        }
        Ok(())
    }

    // ========== Writes ==========

    /// Insert a new document under a generated id
    pub fn add(&self, value: &T) -> Result<WriteOutcome> {
        self.write_document(None, value, &SetOptions::new())
    }

    /// Write a document under a caller-chosen id
    ///
    /// Without `overwrite` this behaves like `add` with a fixed id: an
    /// occupied id yields `Conflict`. With `overwrite` the prior document
    /// (and its index entries or segments) is removed first, in its own
    /// preceding commit.
    pub fn set(&self, id: &KeyPart, value: &T, options: &SetOptions) -> Result<WriteOutcome> {
        self.write_document(Some(id), value, options)
    }

    /// Shallow-merge `data` onto the current value and overwrite
    ///
    /// Returns `Conflict` when the document does not exist. Non-object
    /// documents (or non-object `data`) are replaced rather than merged.
    pub fn update(&self, id: &KeyPart, data: &serde_json::Value) -> Result<WriteOutcome> {
        let Some(current) = self.find(id)? else {
            return Ok(WriteOutcome::Conflict);
        };

        let mut merged = serde_json::to_value(&current.value)?;
        match (merged.as_object_mut(), data.as_object()) {
            (Some(target), Some(updates)) => {
                for (field, value) in updates {
                    target.insert(field.clone(), value.clone());
                }
            }
            _ => merged = data.clone(),
        }

        let value = T::parse(merged)?;
        self.set(id, &value, &SetOptions::overwrite())
    }

    fn write_document(
        &self,
        id: Option<&KeyPart>,
        value: &T,
        options: &SetOptions,
    ) -> Result<WriteOutcome> {
        let (parsed, document) = self.parse_value(value)?;
        let id = match id {
            Some(id) => id.clone(),
            None => self.generate_doc_id(&parsed),
        };

        if self.kind == CollectionKind::Large {
            return self.large_set(&id, &document, options);
        }

        if options.overwrite {
            self.delete_one(&id)?;
        }

        let mut batch = AtomicBatch::new();
        indexable::append_insert(&mut batch, &self.keys, &self.kind, &id, &document)?;
        match self.store.commit(batch)? {
            CommitOutcome::Committed { versionstamp } => {
                Ok(WriteOutcome::Committed { id, versionstamp })
            }
            CommitOutcome::Conflict => Ok(WriteOutcome::Conflict),
        }
    }

    // ========== Deletes ==========

    /// Delete documents by id
    ///
    /// Index entries and segments go with their documents; absent ids are
    /// no-ops.
    pub fn delete(&self, ids: &[KeyPart]) -> Result<()> {
        for id in ids {
            self.delete_one(id)?;
        }
        Ok(())
    }

    pub(crate) fn delete_one(&self, id: &KeyPart) -> Result<()> {
        match &self.kind {
            CollectionKind::Plain => self.store.delete(&self.keys.id_key(id)),
            CollectionKind::Indexable { primary, secondary } => {
                // Index keys depend on the current field values, so the
                // document is read first and everything goes in one batch.
                let id_key = self.keys.id_key(id);
                let entry = self.store.get(&id_key)?;
                let mut batch = AtomicBatch::new().delete(id_key);
                if let Some(Value::Document(json)) = entry.value {
                    let (primary_keys, secondary_keys) =
                        indexable::index_keys(&self.keys, primary, secondary, id, &json);
                    for key in primary_keys.into_iter().chain(secondary_keys) {
                        batch = batch.delete(key);
                    }
                }
                self.store.commit(batch)?;
                Ok(())
            }
            CollectionKind::Large => self.large_delete(id),
        }
    }

    /// Delete every document matching the listing bounds
    pub fn delete_many(&self, options: &ListOptions) -> Result<()> {
        for row in self.scan_ids(options)? {
            if let Some(id) = row.key.trailing_id() {
                self.delete_one(&id.clone())?;
            }
        }
        Ok(())
    }
}
