//! Atomic batches as tagged command queues
//!
//! A batch is plain data: a list of version checks and a list of keyed
//! mutations. The store applies a batch all-or-nothing — every check must
//! pass against current per-key versionstamps, otherwise nothing happens.
//! Keeping the batch as data (rather than deferred closures) lets callers
//! inspect, merge and split batches, and test accumulation logic without a
//! store behind it.

use crate::traits::Store;
use folio_core::error::Result;
use folio_core::key::Key;
use folio_core::limits::{MAX_CHECKS_PER_BATCH, MAX_MUTATIONS_PER_BATCH};
use folio_core::outcome::CommitOutcome;
use folio_core::value::Value;
use folio_core::version::Versionstamp;
use tracing::debug;

/// A version check gating a batch
///
/// `versionstamp: None` asserts the key is absent, which is the insert
/// guard; `Some(v)` asserts the key's current versionstamp equals `v`.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    /// Key whose current versionstamp is compared
    pub key: Key,
    /// Expected versionstamp; `None` means "key must not exist"
    pub versionstamp: Option<Versionstamp>,
}

/// One keyed mutation inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Write the value at the key
    Set(Value),
    /// Remove the key
    Delete,
    /// Add to the 64-bit counter at the key (wrapping); fails the batch if
    /// the current value is not a counter
    Sum(u64),
}

/// An all-or-nothing batch of checks and mutations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomicBatch {
    checks: Vec<Check>,
    mutations: Vec<(Key, Mutation)>,
}

impl AtomicBatch {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a version check
    pub fn check(mut self, key: Key, versionstamp: Option<Versionstamp>) -> Self {
        self.push_check(key, versionstamp);
        self
    }

    /// Append a set mutation
    pub fn set(mut self, key: Key, value: Value) -> Self {
        self.push_mutation(key, Mutation::Set(value));
        self
    }

    /// Append a delete mutation
    pub fn delete(mut self, key: Key) -> Self {
        self.push_mutation(key, Mutation::Delete);
        self
    }

    /// Append a counter addition
    pub fn sum(mut self, key: Key, delta: u64) -> Self {
        self.push_mutation(key, Mutation::Sum(delta));
        self
    }

    /// Append an arbitrary mutation
    pub fn mutate(mut self, key: Key, mutation: Mutation) -> Self {
        self.push_mutation(key, mutation);
        self
    }

    /// Append a version check in place
    pub fn push_check(&mut self, key: Key, versionstamp: Option<Versionstamp>) {
        self.checks.push(Check { key, versionstamp });
    }

    /// Append a mutation in place
    pub fn push_mutation(&mut self, key: Key, mutation: Mutation) {
        self.mutations.push((key, mutation));
    }

    /// Borrow the accumulated checks
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Borrow the accumulated mutations
    pub fn mutations(&self) -> &[(Key, Mutation)] {
        &self.mutations
    }

    /// True when the batch carries neither checks nor mutations
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty() && self.mutations.is_empty()
    }

    /// Total number of checks plus mutations
    pub fn len(&self) -> usize {
        self.checks.len() + self.mutations.len()
    }

    /// Whether the batch exceeds the store's per-batch ceilings
    pub fn exceeds_limits(&self) -> bool {
        self.checks.len() > MAX_CHECKS_PER_BATCH || self.mutations.len() > MAX_MUTATIONS_PER_BATCH
    }

    /// Split into batches that each respect the per-batch ceilings
    ///
    /// Checks and mutations are chunked independently and paired up in
    /// order; a batch that already fits comes back unchanged as a single
    /// element.
    pub fn split(self) -> Vec<AtomicBatch> {
        if !self.exceeds_limits() {
            return vec![self];
        }

        let mut check_chunks: Vec<Vec<Check>> = self
            .checks
            .chunks(MAX_CHECKS_PER_BATCH)
            .map(|c| c.to_vec())
            .collect();
        let mut mutation_chunks: Vec<Vec<(Key, Mutation)>> = self
            .mutations
            .chunks(MAX_MUTATIONS_PER_BATCH)
            .map(|c| c.to_vec())
            .collect();

        let count = check_chunks.len().max(mutation_chunks.len());
        check_chunks.resize(count, Vec::new());
        mutation_chunks.resize(count, Vec::new());

        check_chunks
            .into_iter()
            .zip(mutation_chunks)
            .map(|(checks, mutations)| AtomicBatch { checks, mutations })
            .collect()
    }
}

/// Commit a batch in as many store batches as its size requires
///
/// Splitting gives up atomicity across the produced batches; callers that
/// rely on it (segment writers, bulk cleanup) must tolerate a prefix of the
/// batches applying. Execution stops at the first failed batch — later
/// batches could only add work the caller is about to tear down — and the
/// outcomes produced so far are returned, the failed one included.
pub fn commit_in_batches(store: &dyn Store, batch: AtomicBatch) -> Result<Vec<CommitOutcome>> {
    let batches = batch.split();
    if batches.len() > 1 {
        debug!(batches = batches.len(), "splitting oversized atomic batch");
    }

    let mut outcomes = Vec::with_capacity(batches.len());
    for batch in batches {
        let outcome = store.commit(batch)?;
        let failed = !outcome.is_ok();
        outcomes.push(outcome);
        if failed {
            break;
        }
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn key(n: usize) -> Key {
        Key::root().extend(["batch", "id"]).push(n as i64)
    }

    #[test]
    fn test_builder_accumulates_in_order() {
        let batch = AtomicBatch::new()
            .check(key(0), None)
            .set(key(0), Value::Document(json!(1)))
            .delete(key(1))
            .sum(key(2), 5);

        assert_eq!(batch.checks().len(), 1);
        assert_eq!(batch.mutations().len(), 3);
        assert_eq!(batch.mutations()[0].1, Mutation::Set(Value::Document(json!(1))));
        assert_eq!(batch.mutations()[1].1, Mutation::Delete);
        assert_eq!(batch.mutations()[2].1, Mutation::Sum(5));
    }

    #[test]
    fn test_empty_and_len() {
        let batch = AtomicBatch::new();
        assert!(batch.is_empty());
        let batch = batch.delete(key(0));
        assert!(!batch.is_empty());
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_split_noop_within_limits() {
        let mut batch = AtomicBatch::new();
        for n in 0..10 {
            batch.push_mutation(key(n), Mutation::Delete);
        }
        let batches = batch.clone().split();
        assert_eq!(batches, vec![batch]);
    }

    #[test]
    fn test_split_chunks_mutations() {
        let mut batch = AtomicBatch::new();
        batch.push_check(key(0), None);
        for n in 0..(MAX_MUTATIONS_PER_BATCH * 2 + 1) {
            batch.push_mutation(key(n), Mutation::Delete);
        }

        let batches = batch.split();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].checks().len(), 1, "checks ride the first batch");
        assert_eq!(batches[0].mutations().len(), MAX_MUTATIONS_PER_BATCH);
        assert_eq!(batches[1].mutations().len(), MAX_MUTATIONS_PER_BATCH);
        assert_eq!(batches[2].mutations().len(), 1);
        assert!(batches.iter().all(|b| !b.exceeds_limits()));
    }

    #[test]
    fn test_split_chunks_checks() {
        let mut batch = AtomicBatch::new();
        for n in 0..(MAX_CHECKS_PER_BATCH + 1) {
            batch.push_check(key(n), None);
        }
        let batches = batch.split();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].checks().len(), MAX_CHECKS_PER_BATCH);
        assert_eq!(batches[1].checks().len(), 1);
    }

    #[test]
    fn test_commit_in_batches_applies_all() {
        let store = MemoryStore::new();
        let mut batch = AtomicBatch::new();
        let total = MAX_MUTATIONS_PER_BATCH + 5;
        for n in 0..total {
            batch.push_mutation(key(n), Mutation::Set(Value::Counter(n as u64)));
        }

        let outcomes = commit_in_batches(&store, batch).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.is_ok()));
        for n in 0..total {
            assert!(store.get(&key(n)).unwrap().is_present());
        }
    }

    #[test]
    fn test_commit_in_batches_stops_after_failure() {
        let store = MemoryStore::new();
        // Occupy key(0) so the check in the first chunk fails.
        let seed = AtomicBatch::new().set(key(0), Value::Counter(0));
        assert!(store.commit(seed).unwrap().is_ok());

        let mut batch = AtomicBatch::new();
        batch.push_check(key(0), None);
        for n in 0..(MAX_MUTATIONS_PER_BATCH + 5) {
            batch.push_mutation(key(n + 1), Mutation::Set(Value::Counter(1)));
        }

        let outcomes = commit_in_batches(&store, batch).unwrap();
        assert_eq!(outcomes.len(), 1, "second chunk is never attempted");
        assert!(!outcomes[0].is_ok());
        assert!(!store.get(&key(1)).unwrap().is_present());
    }
}
