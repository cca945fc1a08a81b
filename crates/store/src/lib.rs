//! Store abstraction and in-memory backend for the Folio document layer
//!
//! This crate defines the contract the document layer requires from an
//! ordered key-value store — point reads, consistent batched reads,
//! ordered prefix scans, and all-or-nothing CAS batch commits — plus an
//! in-memory implementation used for embedding and testing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod entry;
pub mod memory;
pub mod traits;

pub use batch::{commit_in_batches, AtomicBatch, Check, Mutation};
pub use entry::{CommittedEntry, Entry, KeySelector, ScanOptions};
pub use memory::MemoryStore;
pub use traits::Store;
