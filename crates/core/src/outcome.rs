//! Commit outcome values
//!
//! Transactional failures are values, not errors: a failed version check
//! (or duplicate unique-index value, or overlap-rule rejection) yields
//! `Conflict`, the caller may retry, and nothing distinguishes which check
//! failed. Store faults and corruption travel separately as `Error`.

use crate::key::KeyPart;
use crate::version::Versionstamp;

/// Outcome of one atomic batch commit at the store level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every check passed; all mutations applied at `versionstamp`
    Committed {
        /// Versionstamp shared by every operation in the batch
        versionstamp: Versionstamp,
    },
    /// A check failed; nothing was applied
    Conflict,
}

impl CommitOutcome {
    /// True when the batch was applied
    pub fn is_ok(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }

    /// The commit versionstamp, when the batch was applied
    pub fn versionstamp(&self) -> Option<Versionstamp> {
        match self {
            CommitOutcome::Committed { versionstamp } => Some(*versionstamp),
            CommitOutcome::Conflict => None,
        }
    }
}

/// Outcome of a document-level write (`add`, `set`, large `set`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The document (and its index entries or segments) was persisted
    Committed {
        /// Id of the written document
        id: KeyPart,
        /// Versionstamp of the committing batch
        versionstamp: Versionstamp,
    },
    /// A check failed (existing id, duplicate unique-index value, lost
    /// race); nothing was persisted
    Conflict,
}

impl WriteOutcome {
    /// True when the document was persisted
    pub fn is_ok(&self) -> bool {
        matches!(self, WriteOutcome::Committed { .. })
    }

    /// Id of the written document, on success
    pub fn id(&self) -> Option<&KeyPart> {
        match self {
            WriteOutcome::Committed { id, .. } => Some(id),
            WriteOutcome::Conflict => None,
        }
    }

    /// Versionstamp of the committing batch, on success
    pub fn versionstamp(&self) -> Option<Versionstamp> {
        match self {
            WriteOutcome::Committed { versionstamp, .. } => Some(*versionstamp),
            WriteOutcome::Conflict => None,
        }
    }
}
