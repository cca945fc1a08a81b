//! Document codec seam
//!
//! Serialized documents pass through a codec before being stored (and
//! sharded, for large collections). The default encodes to JSON text; the
//! trait is the seam for compression or alternative encodings.

use folio_core::error::{Error, Result};

/// Serialization seam for document payloads
///
/// Codecs must be `Send + Sync` so collections sharing one can be used
/// concurrently.
pub trait DocumentCodec: Send + Sync {
    /// Encode a document for storage
    fn encode(&self, document: &serde_json::Value) -> Result<String>;

    /// Decode a stored payload back into a document
    fn decode(&self, payload: &str) -> Result<serde_json::Value>;
}

/// Default codec: compact JSON text
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl DocumentCodec for JsonCodec {
    fn encode(&self, document: &serde_json::Value) -> Result<String> {
        serde_json::to_string(document).map_err(|e| Error::Serialization(e.to_string()))
    }

    fn decode(&self, payload: &str) -> Result<serde_json::Value> {
        serde_json::from_str(payload).map_err(|e| Error::Serialization(e.to_string()))
    }
}
