//! Error types for the document layer
//!
//! The split follows the propagation policy of the layer: transactional
//! failures (version conflicts, duplicate index values, overlap-rule
//! rejections) are reported as commit *outcomes*, never as errors.
//! Everything in this module is a genuine fault: invalid input, corrupted
//! stored data, or a failing store.

use thiserror::Error;

/// Result type alias for document-layer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the document layer
#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The model rejected a candidate value before any store I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// A large document's stored form is unreadable: missing segments or
    /// an undecodable payload. Fatal; never reported as "not found".
    #[error("Corrupted document {id}: {reason}")]
    CorruptedDocument {
        /// Id of the unreadable document
        id: String,
        /// What made the stored form unreadable
        reason: String,
    },

    /// The operation is not valid for this collection or batch
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The underlying store failed; propagated verbatim, never retried here
    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// True for corrupted-document errors
    ///
    /// Callers that sweep or repair distinguish corruption from transient
    /// store failures with this.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CorruptedDocument { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
