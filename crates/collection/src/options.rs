//! Collection, write and list options
//!
//! Options are plain builder structs. Collection options decide the
//! collection's kind (plain, indexable, large) at construction time; write
//! and list options shape individual operations.

use crate::codec::{DocumentCodec, JsonCodec};
use folio_core::document::Document;
use folio_core::key::KeyPart;
use folio_core::model::IdGenerator;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Kind of secondary index maintained for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Unique index: at most one document per field value, enforced by a
    /// version check on the index key
    Primary,
    /// Non-unique index: one entry per matching document
    Secondary,
}

/// Construction options for a collection
pub struct CollectionOptions<T> {
    pub(crate) id_generator: Option<IdGenerator<T>>,
    pub(crate) indices: BTreeMap<String, IndexKind>,
    pub(crate) codec: Arc<dyn DocumentCodec>,
    pub(crate) large: bool,
}

impl<T> CollectionOptions<T> {
    /// Options for an ordinary single-key collection
    pub fn new() -> Self {
        Self {
            id_generator: None,
            indices: BTreeMap::new(),
            codec: Arc::new(JsonCodec),
            large: false,
        }
    }

    /// Options for a large-value collection: serialized documents are
    /// sharded across segments
    pub fn large() -> Self {
        Self {
            large: true,
            ..Self::new()
        }
    }

    /// Declare an index on a document field
    pub fn with_index(mut self, field: impl Into<String>, kind: IndexKind) -> Self {
        self.indices.insert(field.into(), kind);
        self
    }

    /// Override how ids are derived for new documents
    pub fn with_id_generator(mut self, generator: IdGenerator<T>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// Override the document codec
    pub fn with_codec(mut self, codec: Arc<dyn DocumentCodec>) -> Self {
        self.codec = codec;
        self
    }
}

impl<T> Default for CollectionOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CollectionOptions<T> {
    fn clone(&self) -> Self {
        Self {
            id_generator: self.id_generator,
            indices: self.indices.clone(),
            codec: Arc::clone(&self.codec),
            large: self.large,
        }
    }
}

/// Options for `set`-style writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Replace an existing document (and its indexes or segments) instead
    /// of failing on an occupied id
    pub overwrite: bool,
    /// Remaining retries for large-document writes after a failed segment
    /// or manifest batch
    pub retry: u32,
}

impl SetOptions {
    /// Insert-only write
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow replacing an existing document
    pub fn overwrite() -> Self {
        Self {
            overwrite: true,
            ..Self::default()
        }
    }

    /// Retry large-document writes up to `retry` more times
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }
}

/// Options shaping prefix iteration
///
/// `start_id` is inclusive and `end_id` exclusive. `prefix` restricts
/// string ids by prefix. `cursor` resumes a previous listing: strictly
/// after the cursor id on forward scans, strictly before it on reverse
/// scans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    /// Restrict string ids to those starting with this prefix
    pub prefix: Option<String>,
    /// Inclusive lower id bound
    pub start_id: Option<KeyPart>,
    /// Exclusive upper id bound
    pub end_id: Option<KeyPart>,
    /// Resume point from a previous `ListResult::cursor`
    pub cursor: Option<KeyPart>,
    /// Stop after scanning this many entries (applied before filtering)
    pub limit: Option<usize>,
    /// Iterate in descending id order
    pub reverse: bool,
}

impl ListOptions {
    /// Scan everything in id order
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict string ids by prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Inclusive lower id bound
    pub fn with_start_id(mut self, id: KeyPart) -> Self {
        self.start_id = Some(id);
        self
    }

    /// Exclusive upper id bound
    pub fn with_end_id(mut self, id: KeyPart) -> Self {
        self.end_id = Some(id);
        self
    }

    /// Resume from a previous listing's cursor
    pub fn with_cursor(mut self, cursor: KeyPart) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Stop after scanning `limit` entries
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Iterate in descending id order
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    /// Materialized documents that passed the filter, in scan order
    pub documents: Vec<Document<T>>,
    /// Id of the last scanned entry, surfaced verbatim; feed back through
    /// `ListOptions::with_cursor` to resume
    pub cursor: Option<KeyPart>,
}
