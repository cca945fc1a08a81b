//! Large-document sharding
//!
//! Serialized documents that may exceed the store's per-value limit are
//! sliced into fixed-size UTF-8 segments under the collection's `segment`
//! namespace. The id-key holds only a manifest listing the segment indices
//! in order; the manifest is written last, under an absent-key check, so a
//! concurrent reader sees either the prior document (or nothing) or the
//! complete new one, never a partial write.
//!
//! Deletes go the other way: manifest first, then segments, so a reader
//! racing a delete observes a missing document rather than a corrupted one.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collection::Collection;
use crate::options::SetOptions;
use folio_core::document::Document;
use folio_core::error::{Error, Result};
use folio_core::key::{Key, KeyPart};
use folio_core::limits::SEGMENT_VALUE_LIMIT;
use folio_core::model::Model;
use folio_core::outcome::WriteOutcome;
use folio_core::value::Value;
use folio_core::version::Versionstamp;
use folio_store::{commit_in_batches, AtomicBatch, KeySelector, Mutation, ScanOptions, Store};

/// Manifest stored at a large document's id-key
///
/// Lists the segment indices whose ordered concatenation is the document's
/// serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Manifest {
    /// Segment indices in concatenation order
    pub ids: Vec<u32>,
}

/// Slice a string into chunks of at most `max_bytes` bytes
///
/// Chunk boundaries are pulled back onto UTF-8 character boundaries, so
/// every chunk is valid text on its own.
pub(crate) fn chunk_utf8(payload: &str, max_bytes: usize) -> Vec<String> {
    debug_assert!(max_bytes >= 4, "a chunk must fit any UTF-8 scalar");

    let mut chunks = Vec::with_capacity(payload.len() / max_bytes + 1);
    let mut rest = payload;
    while !rest.is_empty() {
        let mut end = rest.len().min(max_bytes);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        chunks.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    chunks
}

impl<T: Model> Collection<T> {
    /// Write a large document: probe the id, shard the payload, publish
    /// the manifest last
    pub(crate) fn large_set(
        &self,
        id: &KeyPart,
        document: &serde_json::Value,
        options: &SetOptions,
    ) -> Result<WriteOutcome> {
        let id_key = self.keys().id_key(id);

        // A lone absent-key check claims the identity before any segment
        // is written.
        let probe = AtomicBatch::new().check(id_key.clone(), None);
        if !self.store().commit(probe)?.is_ok() {
            if !options.overwrite {
                return Ok(WriteOutcome::Conflict);
            }
            self.large_delete(id)?;
        }

        let payload = self.codec().encode(document)?;
        let chunks = chunk_utf8(&payload, SEGMENT_VALUE_LIMIT);
        let manifest = Manifest {
            ids: (0..chunks.len() as u32).collect(),
        };
        let manifest_json = serde_json::to_value(&manifest)?;

        match self.write_segments(id, &id_key, &chunks, &manifest_json)? {
            Some(versionstamp) => Ok(WriteOutcome::Committed {
                id: id.clone(),
                versionstamp,
            }),
            None => {
                self.teardown_segments(id)?;
                if options.retry > 0 {
                    warn!(
                        id = %id,
                        retries_left = options.retry,
                        "large document write failed; retrying"
                    );
                    let retried = SetOptions {
                        retry: options.retry - 1,
                        ..*options
                    };
                    self.large_set(id, document, &retried)
                } else {
                    Ok(WriteOutcome::Conflict)
                }
            }
        }
    }

    /// One write attempt: all segments, then the manifest
    ///
    /// Returns the manifest commit's versionstamp, or `None` when any
    /// batch failed (the caller tears down and decides about retrying).
    fn write_segments(
        &self,
        id: &KeyPart,
        id_key: &Key,
        chunks: &[String],
        manifest_json: &serde_json::Value,
    ) -> Result<Option<Versionstamp>> {
        let mut batch = AtomicBatch::new();
        for (index, chunk) in chunks.iter().enumerate() {
            batch.push_mutation(
                self.keys().segment_key(id, index as u32),
                Mutation::Set(Value::Segment(chunk.clone())),
            );
        }

        let outcomes = commit_in_batches(self.store().as_ref(), batch)?;
        if !outcomes.iter().all(|outcome| outcome.is_ok()) {
            return Ok(None);
        }

        let manifest_batch = AtomicBatch::new()
            .check(id_key.clone(), None)
            .set(id_key.clone(), Value::Document(manifest_json.clone()));
        Ok(self.store().commit(manifest_batch)?.versionstamp())
    }

    /// Remove every segment stored for a document
    fn teardown_segments(&self, id: &KeyPart) -> Result<()> {
        let selector = KeySelector::prefix(self.keys().segment_prefix(id));
        let rows = self.store().list(&selector, &ScanOptions::new())?;
        if rows.is_empty() {
            return Ok(());
        }

        let mut batch = AtomicBatch::new();
        for row in rows {
            batch.push_mutation(row.key, Mutation::Delete);
        }
        commit_in_batches(self.store().as_ref(), batch)?;
        Ok(())
    }

    /// Read a large document by id
    pub(crate) fn large_find(&self, id: &KeyPart) -> Result<Option<Document<T>>> {
        let entry = self.store().get(&self.keys().id_key(id))?;
        match entry.into_parts() {
            Some((value, versionstamp)) => {
                self.assemble_document(id, value, versionstamp).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Reassemble a document from its manifest value
    ///
    /// Any missing segment, mistyped payload or undecodable concatenation
    /// is a `CorruptedDocument` error; corruption is never reported as a
    /// missing document.
    pub(crate) fn assemble_document(
        &self,
        id: &KeyPart,
        manifest_value: Value,
        versionstamp: Versionstamp,
    ) -> Result<Document<T>> {
        let corrupted = |reason: String| Error::CorruptedDocument {
            id: id.to_string(),
            reason,
        };

        let manifest_json = manifest_value
            .into_document()
            .ok_or_else(|| corrupted("manifest entry is not a document".into()))?;
        let manifest: Manifest = serde_json::from_value(manifest_json)
            .map_err(|e| corrupted(format!("unreadable manifest: {}", e)))?;

        let segment_keys: Vec<Key> = manifest
            .ids
            .iter()
            .map(|index| self.keys().segment_key(id, *index))
            .collect();
        let entries = self.store().get_many(&segment_keys)?;

        let mut payload = String::new();
        for (index, entry) in manifest.ids.iter().zip(entries) {
            let value = entry
                .value
                .ok_or_else(|| corrupted(format!("missing segment {}", index)))?;
            let segment = value
                .as_segment()
                .ok_or_else(|| corrupted(format!("segment {} has the wrong type", index)))?;
            payload.push_str(segment);
        }

        let document_json = self
            .codec()
            .decode(&payload)
            .map_err(|e| corrupted(format!("undecodable payload: {}", e)))?;
        let value: T =
            serde_json::from_value(document_json).map_err(|e| corrupted(e.to_string()))?;
        Ok(Document::new(id.clone(), versionstamp, value))
    }

    /// Delete a large document: manifest first, then its segments
    pub(crate) fn large_delete(&self, id: &KeyPart) -> Result<()> {
        let id_key = self.keys().id_key(id);
        if !self.store().get(&id_key)?.is_present() {
            return Ok(());
        }
        self.store().delete(&id_key)?;
        self.teardown_segments(id)
    }
}
