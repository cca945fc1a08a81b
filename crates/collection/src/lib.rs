//! Collections, indexes, large documents and atomic builders for Folio
//!
//! This crate implements the document layer proper on top of the store
//! abstraction:
//! - Collection: CRUD and prefix iteration over single-key documents
//! - Indexable collections: unique and non-unique secondary indexes
//!   maintained inside the owning document's atomic batch
//! - Large collections: transparent sharding of over-sized serialized
//!   documents, manifest-last writes, manifest-first deletes
//! - AtomicBuilder: cross-collection commits with two-phase index deletes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod codec;
pub mod collection;
pub mod indexable;
pub mod keys;
pub mod large;
pub mod options;

pub use builder::{AtomicBuilder, AtomicCheck, AtomicMutation, MutationKind};
pub use codec::{DocumentCodec, JsonCodec};
pub use collection::{Collection, CollectionKind};
pub use indexable::ID_FIELD;
pub use keys::CollectionKeys;
pub use options::{CollectionOptions, IndexKind, ListOptions, ListResult, SetOptions};
