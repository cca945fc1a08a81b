//! # FolioDB
//!
//! A document layer over an ordered key-value store: atomic
//! multi-collection commits, unique and non-unique secondary indexes, and
//! transparent sharding of over-sized documents.
//!
//! FolioDB assumes only a small store contract (point reads, prefix scans,
//! and all-or-nothing batches gated by per-key versionstamp checks) and
//! builds collections on top of it. Index entries live and die inside the
//! owning document's atomic batch; serialized documents that exceed the
//! store's per-value limit are sliced into segments behind a manifest that
//! is always written last.
//!
//! # Quick Start
//!
//! ```
//! use foliodb::{
//!     AtomicBuilder, Collection, CollectionOptions, IndexKind, MemoryStore, Model,
//! };
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     email: String,
//! }
//! impl Model for User {}
//!
//! fn main() -> foliodb::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let users: Collection<User> = Collection::new(
//!         store,
//!         &["users"],
//!         CollectionOptions::new().with_index("email", IndexKind::Primary),
//!     )?;
//!
//!     // Insert and look up through the unique index.
//!     let outcome = users.add(&User {
//!         name: "Alice".into(),
//!         email: "alice@example.com".into(),
//!     })?;
//!     assert!(outcome.is_ok());
//!     let alice = users
//!         .find_by_primary_index("email", &json!("alice@example.com"))?
//!         .unwrap();
//!     assert_eq!(alice.value.name, "Alice");
//!
//!     // A duplicate email fails the whole commit.
//!     let duplicate = users.add(&User {
//!         name: "Impostor".into(),
//!         email: "alice@example.com".into(),
//!     })?;
//!     assert!(!duplicate.is_ok());
//!
//!     // Cross-collection commits go through the builder.
//!     let outcome = AtomicBuilder::new(&users)?
//!         .check([foliodb::AtomicCheck {
//!             id: alice.id.clone(),
//!             versionstamp: Some(alice.versionstamp),
//!         }])
//!         .sum(&foliodb::KeyPart::from("signups"), 1)
//!         .commit()?;
//!     assert!(outcome.is_ok());
//!     Ok(())
//! }
//! ```
//!
//! # Collections
//!
//! | Kind | Purpose | Extra machinery |
//! |------|---------|-----------------|
//! | Plain | Ordinary documents | none |
//! | Indexable | Unique (`Primary`) and non-unique (`Secondary`) field indexes | index entries ride the document's batch |
//! | Large | Documents above the per-value limit | segments plus a manifest written last |
//!
//! # Architecture
//!
//! `folio-core` holds keys, values, versionstamps, outcomes and the model
//! contract; `folio-store` the store trait, atomic batches and the
//! in-memory backend; `folio-collection` the collections and the atomic
//! builder. This crate re-exports the public surface of all three.

// Re-export the public API from the member crates
pub use folio_core::{
    generate_id, CommitOutcome, Document, Error, IdGenerator, Key, KeyPart, Model, Result, Value,
    Versionstamp, WriteOutcome, MAX_CHECKS_PER_BATCH, MAX_MUTATIONS_PER_BATCH,
    SEGMENT_VALUE_LIMIT,
};

pub use folio_store::{
    commit_in_batches, AtomicBatch, Check, CommittedEntry, Entry, KeySelector, MemoryStore,
    Mutation, ScanOptions, Store,
};

pub use folio_collection::{
    AtomicBuilder, AtomicCheck, AtomicMutation, Collection, CollectionKeys, CollectionKind,
    CollectionOptions, DocumentCodec, IndexKind, JsonCodec, ListOptions, ListResult, MutationKind,
    SetOptions, ID_FIELD,
};
