//! Cross-collection atomic builder
//!
//! The builder accumulates operations against one or more collections into
//! a single command queue and commits them as one atomic batch. Index
//! side-effects ride the same batch for adds; for deletes the entries to
//! remove depend on the document's current field values, so deletion runs
//! in two phases: a pre-commit read captures the document, and a
//! post-commit follow-up removes the derived index keys.
//!
//! One commit may not both create and delete index entries in the same
//! collection (the overlap rule): the pre-read sees pre-delete state while
//! the batch writes post-add state, and the follow-up cleanup could then
//! race new entries out of existence. Such commits are rejected before any
//! store I/O.
//!
//! The follow-up cleanups are best-effort. Their outcomes are logged and
//! discarded: the main commit has already succeeded, and every index
//! lookup path tolerates entries pointing at a just-deleted id until the
//! sweep lands.

use tracing::{debug, warn};

use crate::collection::{Collection, CollectionKind};
use crate::indexable;
use crate::keys::CollectionKeys;
use folio_core::error::{Error, Result};
use folio_core::key::{Key, KeyPart};
use folio_core::model::Model;
use folio_core::outcome::CommitOutcome;
use folio_core::value::Value;
use folio_core::version::Versionstamp;
use folio_store::{commit_in_batches, AtomicBatch, Mutation, Store};

/// A raw optimistic-concurrency check on a document
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicCheck {
    /// Document id whose entry is checked
    pub id: KeyPart,
    /// Expected versionstamp; `None` asserts the document does not exist
    pub versionstamp: Option<Versionstamp>,
}

/// Kind of a low-level mutation
#[derive(Debug, Clone)]
pub enum MutationKind<T> {
    /// Write the value, with the same implicit absent-key check and index
    /// fragments as `set`
    Set(T),
    /// Delete the document, registering index cleanup like `delete`
    Delete,
    /// Add to the document's counter value
    Sum(u64),
}

/// A low-level mutation against the active collection
#[derive(Debug, Clone)]
pub struct AtomicMutation<T> {
    /// Target document id
    pub id: KeyPart,
    /// What to do at the id
    pub kind: MutationKind<T>,
}

/// Pre-commit read descriptor for an indexable delete
///
/// Captures everything needed to read the document at commit time and
/// derive the index keys to sweep afterwards.
#[derive(Debug, Clone)]
struct PrepareDelete {
    keys: CollectionKeys,
    id: KeyPart,
    primary: Vec<String>,
    secondary: Vec<String>,
}

/// Accumulator shared across `select` switches
#[derive(Debug, Default, Clone)]
struct BuilderState {
    batch: AtomicBatch,
    prepare_deletes: Vec<PrepareDelete>,
    index_add_collections: Vec<Key>,
    index_delete_collections: Vec<Key>,
}

impl BuilderState {
    fn mark(list: &mut Vec<Key>, base: &Key) {
        if !list.iter().any(|key| key == base) {
            list.push(base.clone());
        }
    }

    fn has_overlap(&self) -> bool {
        self.index_add_collections
            .iter()
            .any(|key| self.index_delete_collections.contains(key))
    }
}

/// Fluent accumulator for cross-collection atomic commits
///
/// Every operation consumes and returns the builder; `select` switches the
/// active collection while keeping the accumulated state, which is how one
/// commit spans several collections.
///
/// # Examples
///
/// ```
/// use folio_collection::{AtomicBuilder, Collection, CollectionOptions};
/// use folio_core::Model;
/// use folio_store::MemoryStore;
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Item {
///     label: String,
/// }
/// impl Model for Item {}
///
/// let store = Arc::new(MemoryStore::new());
/// let items: Collection<Item> =
///     Collection::new(store, &["items"], CollectionOptions::new()).unwrap();
///
/// let outcome = AtomicBuilder::new(&items)
///     .unwrap()
///     .add(&Item { label: "a".into() })
///     .unwrap()
///     .add(&Item { label: "b".into() })
///     .unwrap()
///     .commit()
///     .unwrap();
/// assert!(outcome.is_ok());
/// ```
pub struct AtomicBuilder<'a, T: Model> {
    collection: &'a Collection<T>,
    state: BuilderState,
}

impl<T: Model> std::fmt::Debug for AtomicBuilder<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicBuilder")
            .field("collection", self.collection.keys().base())
            .field("state", &self.state)
            .finish()
    }
}

impl<'a, T: Model> AtomicBuilder<'a, T> {
    /// Start a builder against an initial collection
    ///
    /// # Errors
    ///
    /// Large collections are rejected: their writes span several store
    /// commits and cannot ride one atomic batch.
    pub fn new(collection: &'a Collection<T>) -> Result<Self> {
        Self::with_state(collection, BuilderState::default())
    }

    fn with_state(collection: &'a Collection<T>, state: BuilderState) -> Result<Self> {
        if collection.kind() == &CollectionKind::Large {
            return Err(Error::InvalidOperation(
                "large collections cannot participate in atomic commits".into(),
            ));
        }
        Ok(Self { collection, state })
    }

    /// Switch the active collection, keeping the accumulated operations
    ///
    /// # Errors
    ///
    /// Rejects large collections and collections over a different store.
    pub fn select<U: Model>(self, collection: &'a Collection<U>) -> Result<AtomicBuilder<'a, U>> {
        let ours = std::sync::Arc::as_ptr(self.collection.store()) as *const ();
        let theirs = std::sync::Arc::as_ptr(collection.store()) as *const ();
        if !std::ptr::eq(ours, theirs) {
            return Err(Error::InvalidOperation(
                "all collections in one commit must share a store".into(),
            ));
        }
        AtomicBuilder::with_state(collection, self.state)
    }

    /// Enqueue an insert under a generated id
    pub fn add(mut self, value: &T) -> Result<Self> {
        let (parsed, document) = self.collection.parse_value(value)?;
        let id = self.collection.generate_doc_id(&parsed);
        self.enqueue_insert(&id, &document)?;
        Ok(self)
    }

    /// Enqueue an insert under a caller-chosen id
    pub fn set(mut self, id: &KeyPart, value: &T) -> Result<Self> {
        let (_, document) = self.collection.parse_value(value)?;
        self.enqueue_insert(id, &document)?;
        Ok(self)
    }

    /// Enqueue a document delete
    ///
    /// For indexable collections this also registers the pre-commit read
    /// that captures the document for post-commit index cleanup.
    pub fn delete(mut self, id: &KeyPart) -> Self {
        self.enqueue_delete(id);
        self
    }

    /// Enqueue raw version checks
    pub fn check(mut self, checks: impl IntoIterator<Item = AtomicCheck>) -> Self {
        for check in checks {
            let key = self.collection.keys().id_key(&check.id);
            self.state.batch.push_check(key, check.versionstamp);
        }
        self
    }

    /// Enqueue a counter addition
    ///
    /// Valid only for documents holding the store's counter type; a
    /// mistyped target fails the batch at the store layer.
    pub fn sum(mut self, id: &KeyPart, delta: u64) -> Self {
        let key = self.collection.keys().id_key(id);
        self.state.batch.push_mutation(key, Mutation::Sum(delta));
        self
    }

    /// Enqueue low-level mutations
    pub fn mutate(mut self, mutations: impl IntoIterator<Item = AtomicMutation<T>>) -> Result<Self> {
        for mutation in mutations {
            match mutation.kind {
                MutationKind::Set(value) => {
                    let (_, document) = self.collection.parse_value(&value)?;
                    self.enqueue_insert(&mutation.id, &document)?;
                }
                MutationKind::Delete => self.enqueue_delete(&mutation.id),
                MutationKind::Sum(delta) => {
                    let key = self.collection.keys().id_key(&mutation.id);
                    self.state.batch.push_mutation(key, Mutation::Sum(delta));
                }
            }
        }
        Ok(self)
    }

    fn enqueue_insert(&mut self, id: &KeyPart, document: &serde_json::Value) -> Result<()> {
        indexable::append_insert(
            &mut self.state.batch,
            self.collection.keys(),
            self.collection.kind(),
            id,
            document,
        )?;
        if matches!(self.collection.kind(), CollectionKind::Indexable { .. }) {
            BuilderState::mark(
                &mut self.state.index_add_collections,
                self.collection.keys().base(),
            );
        }
        Ok(())
    }

    fn enqueue_delete(&mut self, id: &KeyPart) {
        let id_key = self.collection.keys().id_key(id);
        self.state.batch.push_mutation(id_key, Mutation::Delete);

        if let CollectionKind::Indexable { primary, secondary } = self.collection.kind() {
            BuilderState::mark(
                &mut self.state.index_delete_collections,
                self.collection.keys().base(),
            );
            self.state.prepare_deletes.push(PrepareDelete {
                keys: self.collection.keys().clone(),
                id: id.clone(),
                primary: primary.clone(),
                secondary: secondary.clone(),
            });
        }
    }

    /// Commit everything accumulated so far
    ///
    /// Sequence: reject overlapping index adds/deletes before any I/O,
    /// evaluate the delete-prepare reads, commit the batch, then issue the
    /// best-effort index cleanups for documents that existed.
    pub fn commit(self) -> Result<CommitOutcome> {
        let store = self.collection.store().as_ref();
        let state = self.state;

        if state.has_overlap() {
            debug!("rejecting commit mixing index adds and deletes in one collection");
            return Ok(CommitOutcome::Conflict);
        }

        let mut cleanup_plans: Vec<Vec<Key>> = Vec::new();
        for prepare in &state.prepare_deletes {
            let entry = store.get(&prepare.keys.id_key(&prepare.id))?;
            if let Some(Value::Document(json)) = entry.value {
                let (primary_keys, secondary_keys) = indexable::index_keys(
                    &prepare.keys,
                    &prepare.primary,
                    &prepare.secondary,
                    &prepare.id,
                    &json,
                );
                let plan: Vec<Key> = primary_keys.into_iter().chain(secondary_keys).collect();
                if !plan.is_empty() {
                    cleanup_plans.push(plan);
                }
            }
        }

        let outcome = store.commit(state.batch)?;

        if outcome.is_ok() {
            for plan in cleanup_plans {
                let mut cleanup = AtomicBatch::new();
                for key in plan {
                    cleanup.push_mutation(key, Mutation::Delete);
                }
                match commit_in_batches(store, cleanup) {
                    Ok(outcomes) if outcomes.iter().all(|o| o.is_ok()) => {}
                    Ok(_) => {
                        warn!("index cleanup batch failed; stale entries remain until resweep")
                    }
                    Err(e) => {
                        warn!(error = %e, "index cleanup errored; stale entries remain until resweep")
                    }
                }
            }
        }

        Ok(outcome)
    }
}
