//! Large-document sharding: round trips, manifests, corruption, retries

use foliodb::{
    AtomicBatch, Collection, CollectionOptions, CommitOutcome, CommittedEntry, Entry, Key,
    KeyPart, KeySelector, ListOptions, MemoryStore, Model, ScanOptions, SetOptions, Store,
    WriteOutcome, SEGMENT_VALUE_LIMIT,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Blob {
    data: String,
}

impl Model for Blob {}

/// A blob whose JSON encoding is exactly `target` bytes long
fn blob_of_json_len(target: usize) -> Blob {
    // {"data":"..."} carries 11 bytes of framing around the payload.
    Blob {
        data: "x".repeat(target - 11),
    }
}

fn blobs(store: &Arc<dyn Store>) -> Collection<Blob> {
    Collection::new(Arc::clone(store), &["blobs"], CollectionOptions::large()).unwrap()
}

fn segment_rows(store: &dyn Store, coll: &Collection<Blob>, id: &KeyPart) -> Vec<CommittedEntry> {
    store
        .list(
            &KeySelector::prefix(coll.keys().segment_prefix(id)),
            &ScanOptions::new(),
        )
        .unwrap()
}

// ========================================
// Round trips
// ========================================

#[test]
fn small_document_round_trips_in_one_segment() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");

    let blob = Blob {
        data: "hello".into(),
    };
    assert!(blobs.set(&id, &blob, &SetOptions::new()).unwrap().is_ok());
    assert_eq!(blobs.find(&id).unwrap().unwrap().value, blob);
    assert_eq!(segment_rows(store.as_ref(), &blobs, &id).len(), 1);
}

#[test]
fn oversized_document_shards_into_three_segments() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");

    let blob = blob_of_json_len(SEGMENT_VALUE_LIMIT * 5 / 2);
    let outcome = blobs.set(&id, &blob, &SetOptions::new()).unwrap();
    assert!(outcome.is_ok());

    // Manifest lists segments 0, 1, 2.
    let manifest_entry: Entry = store.get(&blobs.keys().id_key(&id)).unwrap();
    let manifest = manifest_entry.value.unwrap().into_document().unwrap();
    assert_eq!(manifest, json!({"ids": [0, 1, 2]}));

    // Concatenated segments equal the original JSON encoding.
    let rows = segment_rows(store.as_ref(), &blobs, &id);
    assert_eq!(rows.len(), 3);
    let concatenated: String = rows
        .iter()
        .map(|row| row.value.as_segment().unwrap())
        .collect();
    assert_eq!(concatenated, serde_json::to_string(&blob).unwrap());
    assert!(rows
        .iter()
        .all(|row| row.value.as_segment().unwrap().len() <= SEGMENT_VALUE_LIMIT));

    // And the document reads back structurally equal.
    assert_eq!(blobs.find(&id).unwrap().unwrap().value, blob);
}

#[test]
fn listing_reassembles_large_documents() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let blobs = blobs(&store);

    for id in ["a", "b"] {
        blobs
            .set(
                &KeyPart::from(id),
                &blob_of_json_len(SEGMENT_VALUE_LIMIT + 100),
                &SetOptions::new(),
            )
            .unwrap();
    }

    let listed = blobs.list(&ListOptions::new()).unwrap();
    assert_eq!(listed.documents.len(), 2);
    assert!(listed
        .documents
        .iter()
        .all(|d| d.value.data.len() == SEGMENT_VALUE_LIMIT + 100 - 11));
}

// ========================================
// Identity semantics
// ========================================

#[test]
fn occupied_id_without_overwrite_is_conflict() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");

    let original = Blob {
        data: "original".into(),
    };
    blobs.set(&id, &original, &SetOptions::new()).unwrap();

    let outcome = blobs
        .set(
            &id,
            &Blob {
                data: "replacement".into(),
            },
            &SetOptions::new(),
        )
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Conflict);
    assert_eq!(blobs.find(&id).unwrap().unwrap().value, original);
}

#[test]
fn overwrite_replaces_and_leaves_no_stray_segments() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");

    // Three segments first, then a one-segment replacement.
    blobs
        .set(
            &id,
            &blob_of_json_len(SEGMENT_VALUE_LIMIT * 5 / 2),
            &SetOptions::new(),
        )
        .unwrap();
    let replacement = Blob {
        data: "short".into(),
    };
    assert!(blobs
        .set(&id, &replacement, &SetOptions::overwrite())
        .unwrap()
        .is_ok());

    assert_eq!(blobs.find(&id).unwrap().unwrap().value, replacement);
    assert_eq!(segment_rows(store.as_ref(), &blobs, &id).len(), 1);
}

#[test]
fn delete_removes_manifest_and_segments() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");
    blobs
        .set(
            &id,
            &blob_of_json_len(SEGMENT_VALUE_LIMIT * 2),
            &SetOptions::new(),
        )
        .unwrap();

    blobs.delete(std::slice::from_ref(&id)).unwrap();
    assert!(blobs.find(&id).unwrap().is_none());
    assert!(segment_rows(store.as_ref(), &blobs, &id).is_empty());

    // Deleting an absent document is a no-op.
    blobs.delete(std::slice::from_ref(&id)).unwrap();
}

#[test]
fn update_merges_large_documents() {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        bio: String,
        motto: String,
    }
    impl Model for Profile {}

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let profiles: Collection<Profile> =
        Collection::new(Arc::clone(&store), &["profiles"], CollectionOptions::large()).unwrap();
    let id = KeyPart::from("p1");

    profiles
        .set(
            &id,
            &Profile {
                bio: "long".repeat(SEGMENT_VALUE_LIMIT / 2),
                motto: "old".into(),
            },
            &SetOptions::new(),
        )
        .unwrap();

    assert!(profiles
        .update(&id, &json!({"motto": "new"}))
        .unwrap()
        .is_ok());
    let updated = profiles.find(&id).unwrap().unwrap();
    assert_eq!(updated.value.motto, "new");
    assert_eq!(updated.value.bio.len(), 4 * (SEGMENT_VALUE_LIMIT / 2));
}

// ========================================
// Corruption
// ========================================

#[test]
fn missing_segment_is_a_typed_corruption_error() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");
    blobs
        .set(
            &id,
            &blob_of_json_len(SEGMENT_VALUE_LIMIT * 2),
            &SetOptions::new(),
        )
        .unwrap();

    // Remove one segment behind the collection's back.
    store.delete(&blobs.keys().segment_key(&id, 1)).unwrap();

    let err = blobs.find(&id).unwrap_err();
    assert!(err.is_corruption(), "got {:?} instead", err);
}

#[test]
fn undecodable_payload_is_a_typed_corruption_error() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");
    blobs
        .set(
            &id,
            &Blob {
                data: "fine".into(),
            },
            &SetOptions::new(),
        )
        .unwrap();

    // Truncate the only segment so the JSON no longer parses.
    let key = blobs.keys().segment_key(&id, 0);
    let batch = AtomicBatch::new().set(key, foliodb::Value::Segment("{\"data\":\"fi".into()));
    assert!(store.commit(batch).unwrap().is_ok());

    let err = blobs.find(&id).unwrap_err();
    assert!(err.is_corruption(), "got {:?} instead", err);
}

// ========================================
// Failure injection
// ========================================

/// Store wrapper that fails chosen commits (by 1-based commit number) with
/// a conflict, leaving every other operation untouched
struct FlakyStore {
    inner: MemoryStore,
    fail_on: Mutex<HashSet<u64>>,
    commits: AtomicU64,
}

impl FlakyStore {
    fn failing_on(commits: impl IntoIterator<Item = u64>) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_on: Mutex::new(commits.into_iter().collect()),
            commits: AtomicU64::new(0),
        }
    }
}

impl Store for FlakyStore {
    fn get(&self, key: &Key) -> foliodb::Result<Entry> {
        self.inner.get(key)
    }

    fn get_many(&self, keys: &[Key]) -> foliodb::Result<Vec<Entry>> {
        self.inner.get_many(keys)
    }

    fn list(
        &self,
        selector: &KeySelector,
        options: &ScanOptions,
    ) -> foliodb::Result<Vec<CommittedEntry>> {
        self.inner.list(selector, options)
    }

    fn delete(&self, key: &Key) -> foliodb::Result<()> {
        self.inner.delete(key)
    }

    fn commit(&self, batch: AtomicBatch) -> foliodb::Result<CommitOutcome> {
        let number = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.lock().remove(&number) {
            return Ok(CommitOutcome::Conflict);
        }
        self.inner.commit(batch)
    }
}

#[test]
fn failed_segment_batch_retries_to_success() {
    // Commit 1 is the id probe, commit 2 the segment batch.
    let store: Arc<dyn Store> = Arc::new(FlakyStore::failing_on([2]));
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");

    let blob = blob_of_json_len(SEGMENT_VALUE_LIMIT * 5 / 2);
    let outcome = blobs
        .set(&id, &blob, &SetOptions::new().with_retry(2))
        .unwrap();
    assert!(outcome.is_ok());

    // The retried write is fully consistent: three segments, no strays.
    assert_eq!(segment_rows(store.as_ref(), &blobs, &id).len(), 3);
    assert_eq!(blobs.find(&id).unwrap().unwrap().value, blob);
}

#[test]
fn failed_manifest_commit_retries_without_stray_segments() {
    // Commit 1 probe, commit 2 segments, commit 3 manifest.
    let store: Arc<dyn Store> = Arc::new(FlakyStore::failing_on([3]));
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");

    let blob = blob_of_json_len(SEGMENT_VALUE_LIMIT * 3 / 2);
    let outcome = blobs
        .set(&id, &blob, &SetOptions::new().with_retry(1))
        .unwrap();
    assert!(outcome.is_ok());

    assert_eq!(segment_rows(store.as_ref(), &blobs, &id).len(), 2);
    assert_eq!(blobs.find(&id).unwrap().unwrap().value, blob);
}

#[test]
fn exhausted_retries_leave_no_partial_document() {
    let store: Arc<dyn Store> = Arc::new(FlakyStore::failing_on([2]));
    let blobs = blobs(&store);
    let id = KeyPart::from("b1");

    let outcome = blobs
        .set(
            &id,
            &blob_of_json_len(SEGMENT_VALUE_LIMIT * 2),
            &SetOptions::new(),
        )
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Conflict);

    // No manifest, no segments: a reader sees a missing document, never a
    // partial one.
    assert!(blobs.find(&id).unwrap().is_none());
    assert!(segment_rows(store.as_ref(), &blobs, &id).is_empty());
}
