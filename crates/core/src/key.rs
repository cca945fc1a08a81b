//! Composite keys for the document layer
//!
//! A key is an ordered sequence of parts. Keys are compared part-wise and
//! lexicographically, which makes prefix enumeration in an ordered store
//! line up with the namespace hierarchy. Keys are immutable values:
//! `extend` returns a new key, callers never mutate parts in place.
//!
//! ## Namespace layout
//!
//! All data lives under a single reserved root segment. Within a collection
//! rooted at path `P`, four sub-namespaces exist:
//!
//! - `P / "id" / <doc_id>` — the canonical document entry
//! - `P / "segment" / <doc_id> / <index>` — large-document chunks
//! - `P / "primary_index" / <field> / <value>` — unique index entries
//! - `P / "secondary_index" / <field> / <value> / <doc_id>` — non-unique
//!   index entries
//!
//! The root segment is part of the persisted key layout and must stay
//! stable across versions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved root segment under which all collection data lives
pub const ROOT_SEGMENT: &str = "__folio__";

/// Namespace marker for canonical document entries
pub const ID_SEGMENT: &str = "id";

/// Namespace marker for large-document chunk entries
pub const SEGMENT_SEGMENT: &str = "segment";

/// Namespace marker for unique index entries
pub const PRIMARY_INDEX_SEGMENT: &str = "primary_index";

/// Namespace marker for non-unique index entries
pub const SECONDARY_INDEX_SEGMENT: &str = "secondary_index";

/// One part of a composite key
///
/// Parts are ordered by variant first (`Bytes < String < Int`), then by
/// value. The derived ordering is deterministic and total, which is all the
/// ordered store needs for prefix scans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyPart {
    /// Raw binary part
    Bytes(Vec<u8>),
    /// UTF-8 string part (document ids, namespace markers, field names)
    String(String),
    /// Signed integer part (segment indices, numeric ids)
    Int(i64),
}

impl KeyPart {
    /// Render the part for key display; binary parts are hex-encoded
    fn write_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Bytes(bytes) => {
                write!(f, "0x")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            KeyPart::String(s) => write!(f, "{}", s),
            KeyPart::Int(n) => write!(f, "{}", n),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f)
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::String(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::String(s)
    }
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        KeyPart::Int(n)
    }
}

impl From<u32> for KeyPart {
    fn from(n: u32) -> Self {
        KeyPart::Int(n as i64)
    }
}

impl From<Vec<u8>> for KeyPart {
    fn from(bytes: Vec<u8>) -> Self {
        KeyPart::Bytes(bytes)
    }
}

/// Composite key: an ordered sequence of parts
///
/// Ordering is part-wise lexicographic (the derived `Ord` on the inner
/// `Vec<KeyPart>`), so a key always sorts before any of its extensions and
/// all extensions of one prefix are contiguous in the store.
///
/// # Examples
///
/// ```
/// use folio_core::key::{Key, KeyPart};
///
/// let users = Key::root().extend(["users"]);
/// let alice = users.extend(["id", "alice"]);
/// assert!(alice.starts_with(&users));
/// assert_eq!(alice.trailing_id(), Some(&KeyPart::from("alice")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(Vec<KeyPart>);

impl Key {
    /// Create a key from its parts
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    /// The reserved root key under which all collections live
    pub fn root() -> Self {
        Self(vec![KeyPart::from(ROOT_SEGMENT)])
    }

    /// Return a new key with the given parts appended
    pub fn extend<I, P>(&self, parts: I) -> Key
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        let mut out = self.0.clone();
        out.extend(parts.into_iter().map(Into::into));
        Key(out)
    }

    /// Return a new key with a single part appended
    pub fn push(&self, part: impl Into<KeyPart>) -> Key {
        self.extend([part.into()])
    }

    /// Borrow the parts of this key
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty key
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether this key extends (or equals) the given prefix
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Last part of the key
    pub fn last(&self) -> Option<&KeyPart> {
        self.0.last()
    }

    /// Extract the trailing document id
    ///
    /// Returns the last part iff the penultimate part is the `"id"`
    /// namespace marker; `None` for any other key shape.
    pub fn trailing_id(&self) -> Option<&KeyPart> {
        let len = self.0.len();
        if len < 2 {
            return None;
        }
        match &self.0[len - 2] {
            KeyPart::String(s) if s == ID_SEGMENT => self.0.last(),
            _ => None,
        }
    }

    /// Smallest key that orders strictly after this one
    ///
    /// Appends the minimal part, so the result sorts after `self` but
    /// before every sibling of `self`. Used for exclusive-start cursors.
    pub fn successor(&self) -> Key {
        self.push(KeyPart::Bytes(Vec::new()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            part.write_display(f)?;
        }
        Ok(())
    }
}

impl FromIterator<KeyPart> for Key {
    fn from_iter<I: IntoIterator<Item = KeyPart>>(iter: I) -> Self {
        Key(iter.into_iter().collect())
    }
}
