//! Model contract and id generation
//!
//! A model validates and normalizes candidate values before they reach the
//! store. The contract is deliberately small: `parse` either returns the
//! normalized value or fails, and a failure aborts the enclosing write
//! before any store I/O.

use crate::error::{Error, Result};
use crate::key::KeyPart;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Mutex, OnceLock};
use uuid::timestamp::context::ContextV7;
use uuid::{Timestamp, Uuid};

/// Validation and normalization contract for document types
///
/// The default `parse` deserializes the candidate through serde, so a plain
/// `impl Model for T {}` gives structural validation for free. Override it
/// to normalize or to enforce invariants serde cannot express.
///
/// # Examples
///
/// ```
/// use folio_core::model::Model;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// impl Model for User {}
///
/// let user = User::parse(serde_json::json!({"name": "alice"})).unwrap();
/// assert_eq!(user.name, "alice");
/// assert!(User::parse(serde_json::json!({"name": 42})).is_err());
/// ```
pub trait Model: Serialize + DeserializeOwned + Clone {
    /// Validate and normalize a candidate value
    fn parse(input: serde_json::Value) -> Result<Self> {
        serde_json::from_value(input).map_err(|e| Error::Validation(e.to_string()))
    }
}

/// Function overriding how a collection derives ids for new documents
pub type IdGenerator<T> = fn(&T) -> KeyPart;

/// Generate a time-ordered document id
///
/// UUIDv7 rendered without hyphens: the leading bits encode the timestamp
/// and a shared monotonic context orders ids minted within the same
/// millisecond, so freshly generated ids sort in creation order under
/// string comparison.
pub fn generate_id() -> KeyPart {
    static CONTEXT: OnceLock<Mutex<ContextV7>> = OnceLock::new();
    let context = CONTEXT.get_or_init(|| Mutex::new(ContextV7::new()));
    let id = Uuid::new_v7(Timestamp::now(context));
    KeyPart::String(id.simple().to_string())
}
