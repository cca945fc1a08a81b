//! Store abstraction
//!
//! The document layer treats the underlying ordered key-value store as a
//! black box behind this trait. Minimum semantics required: serializable
//! multi-key CAS batches, per-key monotonic versionstamps, and ordered
//! prefix scans. The trait is object-safe so collections can share a store
//! as `Arc<dyn Store>`.

use crate::batch::AtomicBatch;
use crate::entry::{CommittedEntry, Entry, KeySelector, ScanOptions};
use folio_core::error::Result;
use folio_core::key::Key;
use folio_core::outcome::CommitOutcome;

/// Ordered key-value store with CAS batch commits
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Store: Send + Sync {
    /// Point lookup
    ///
    /// Returns the absent entry (value and versionstamp both `None`) for
    /// missing keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    fn get(&self, key: &Key) -> Result<Entry>;

    /// Batched point lookups, input order preserved
    ///
    /// All entries come from one consistent view of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    fn get_many(&self, keys: &[Key]) -> Result<Vec<Entry>>;

    /// Ordered range scan
    ///
    /// Returns every entry matching the selector, in key order (descending
    /// when `options.reverse`), truncated to `options.limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    fn list(&self, selector: &KeySelector, options: &ScanOptions) -> Result<Vec<CommittedEntry>>;

    /// Unconditional single-key delete
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    fn delete(&self, key: &Key) -> Result<()>;

    /// Commit an atomic batch
    ///
    /// All-or-nothing: every check must pass against current per-key
    /// versionstamps, otherwise nothing is applied and `Conflict` comes
    /// back. On success every mutation carries the same fresh versionstamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails, including a `sum`
    /// against a non-counter value.
    fn commit(&self, batch: AtomicBatch) -> Result<CommitOutcome>;
}
