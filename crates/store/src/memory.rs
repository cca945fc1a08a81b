//! In-memory store backend
//!
//! `MemoryStore` implements the `Store` trait with a `BTreeMap` under a
//! single `parking_lot::RwLock` and an `AtomicU64` versionstamp counter.
//! A batch commit validates every check and applies every mutation while
//! holding the write lock once, so readers observe either all of a batch
//! or none of it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::batch::{AtomicBatch, Mutation};
use crate::entry::{CommittedEntry, Entry, KeySelector, ScanOptions};
use crate::traits::Store;
use folio_core::error::{Error, Result};
use folio_core::key::Key;
use folio_core::outcome::CommitOutcome;
use folio_core::value::Value;
use folio_core::version::Versionstamp;

/// Ordered in-memory store with versionstamped CAS commits
///
/// # Examples
///
/// ```
/// use folio_store::{AtomicBatch, MemoryStore, Store};
/// use folio_core::{Key, Value};
///
/// let store = MemoryStore::new();
/// let key = Key::root().extend(["demo", "id", "a"]);
///
/// let batch = AtomicBatch::new()
///     .check(key.clone(), None)
///     .set(key.clone(), Value::Counter(1));
/// assert!(store.commit(batch).unwrap().is_ok());
/// assert!(store.get(&key).unwrap().is_present());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Ordered map from key to (value, storing versionstamp)
    data: RwLock<BTreeMap<Key, (Value, Versionstamp)>>,
    /// Monotonic sequence backing versionstamp allocation
    sequence: AtomicU64,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next versionstamp
    fn next_versionstamp(&self) -> Versionstamp {
        Versionstamp::from_sequence(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True when no keys are stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &Key) -> Result<Entry> {
        let data = self.data.read();
        Ok(match data.get(key) {
            Some((value, versionstamp)) => Entry::present(value.clone(), *versionstamp),
            None => Entry::absent(),
        })
    }

    fn get_many(&self, keys: &[Key]) -> Result<Vec<Entry>> {
        // One lock acquisition: every entry comes from the same view.
        let data = self.data.read();
        Ok(keys
            .iter()
            .map(|key| match data.get(key) {
                Some((value, versionstamp)) => Entry::present(value.clone(), *versionstamp),
                None => Entry::absent(),
            })
            .collect())
    }

    fn list(&self, selector: &KeySelector, options: &ScanOptions) -> Result<Vec<CommittedEntry>> {
        let data = self.data.read();

        let mut rows: Vec<CommittedEntry> = data
            .range(selector.prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&selector.prefix))
            .filter(|(key, _)| selector.contains(key))
            .map(|(key, (value, versionstamp))| CommittedEntry {
                key: key.clone(),
                value: value.clone(),
                versionstamp: *versionstamp,
            })
            .collect();

        if options.reverse {
            rows.reverse();
        }
        if let Some(limit) = options.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn delete(&self, key: &Key) -> Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn commit(&self, batch: AtomicBatch) -> Result<CommitOutcome> {
        let mut data = self.data.write();

        // Validate every check against current versionstamps.
        for check in batch.checks() {
            let current = data.get(&check.key).map(|(_, versionstamp)| *versionstamp);
            if current != check.versionstamp {
                trace!(key = %check.key, "version check failed");
                return Ok(CommitOutcome::Conflict);
            }
        }

        // A sum against a non-counter value fails the whole batch before
        // anything is applied.
        for (key, mutation) in batch.mutations() {
            if matches!(mutation, Mutation::Sum(_)) {
                if let Some((value, _)) = data.get(key) {
                    if !value.is_counter() {
                        return Err(Error::InvalidOperation(format!(
                            "sum target {} is not a counter",
                            key
                        )));
                    }
                }
            }
        }

        let versionstamp = self.next_versionstamp();
        for (key, mutation) in batch.mutations() {
            match mutation {
                Mutation::Set(value) => {
                    data.insert(key.clone(), (value.clone(), versionstamp));
                }
                Mutation::Delete => {
                    data.remove(key);
                }
                Mutation::Sum(delta) => {
                    let current = data
                        .get(key)
                        .and_then(|(value, _)| value.as_counter())
                        .unwrap_or(0);
                    data.insert(
                        key.clone(),
                        (Value::Counter(current.wrapping_add(*delta)), versionstamp),
                    );
                }
            }
        }

        Ok(CommitOutcome::Committed { versionstamp })
    }
}
