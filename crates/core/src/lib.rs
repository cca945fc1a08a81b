//! Core types for the Folio document layer
//!
//! This crate defines the foundational types used throughout the system:
//! - Key / KeyPart: composite keys with part-wise lexicographic ordering
//! - Value: the three store payload shapes (document, segment, counter)
//! - Versionstamp: the store's opaque per-commit CAS token
//! - Model: parse/validate contract plus time-ordered id generation
//! - CommitOutcome / WriteOutcome: transactional results as values
//! - Document: a decoded value with its identity and read versionstamp
//! - Error: error type hierarchy
//! - Limits: segment and batch size ceilings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod key;
pub mod limits;
pub mod model;
pub mod outcome;
pub mod value;
pub mod version;

// Re-export commonly used types at the crate root
pub use document::Document;
pub use error::{Error, Result};
pub use key::{
    Key, KeyPart, ID_SEGMENT, PRIMARY_INDEX_SEGMENT, ROOT_SEGMENT, SECONDARY_INDEX_SEGMENT,
    SEGMENT_SEGMENT,
};
pub use limits::{MAX_CHECKS_PER_BATCH, MAX_MUTATIONS_PER_BATCH, SEGMENT_VALUE_LIMIT};
pub use model::{generate_id, IdGenerator, Model};
pub use outcome::{CommitOutcome, WriteOutcome};
pub use value::Value;
pub use version::Versionstamp;
