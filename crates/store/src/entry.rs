//! Read-side store types
//!
//! `Entry` is the answer to a point `get`: value and versionstamp together,
//! both absent for missing keys. The absent form is what a
//! `versionstamp: None` check compares against, which is how insert-only
//! writes are expressed. `CommittedEntry` is one row of a range scan.

use folio_core::key::Key;
use folio_core::value::Value;
use folio_core::version::Versionstamp;

/// Result of a point lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Stored value, `None` if the key is absent
    pub value: Option<Value>,
    /// Versionstamp of the storing commit, `None` if the key is absent
    pub versionstamp: Option<Versionstamp>,
}

impl Entry {
    /// The entry for an absent key
    pub fn absent() -> Self {
        Self {
            value: None,
            versionstamp: None,
        }
    }

    /// The entry for a present key
    pub fn present(value: Value, versionstamp: Versionstamp) -> Self {
        Self {
            value: Some(value),
            versionstamp: Some(versionstamp),
        }
    }

    /// True when the key exists
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// Split into value and versionstamp when present
    pub fn into_parts(self) -> Option<(Value, Versionstamp)> {
        match (self.value, self.versionstamp) {
            (Some(value), Some(versionstamp)) => Some((value, versionstamp)),
            _ => None,
        }
    }
}

/// One row of a range scan
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedEntry {
    /// Full key of the row
    pub key: Key,
    /// Stored value
    pub value: Value,
    /// Versionstamp of the storing commit
    pub versionstamp: Versionstamp,
}

/// Range selector: a prefix with optional cursor bounds
///
/// `start` is inclusive and `end` exclusive, both compared in key order.
/// Bounds tighten the prefix range; they never widen it.
#[derive(Debug, Clone, PartialEq)]
pub struct KeySelector {
    /// All returned keys extend this prefix
    pub prefix: Key,
    /// Inclusive lower bound
    pub start: Option<Key>,
    /// Exclusive upper bound
    pub end: Option<Key>,
}

impl KeySelector {
    /// Select every key under a prefix
    pub fn prefix(prefix: Key) -> Self {
        Self {
            prefix,
            start: None,
            end: None,
        }
    }

    /// Restrict to keys at or after `start`
    pub fn with_start(mut self, start: Key) -> Self {
        self.start = Some(start);
        self
    }

    /// Restrict to keys strictly before `end`
    pub fn with_end(mut self, end: Key) -> Self {
        self.end = Some(end);
        self
    }

    /// Whether a key falls inside this selector
    pub fn contains(&self, key: &Key) -> bool {
        if !key.starts_with(&self.prefix) {
            return false;
        }
        if let Some(start) = &self.start {
            if key < start {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if key >= end {
                return false;
            }
        }
        true
    }
}

/// Scan shaping options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Stop after this many rows
    pub limit: Option<usize>,
    /// Return rows in descending key order
    pub reverse: bool,
}

impl ScanOptions {
    /// Unlimited forward scan
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after `limit` rows
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Scan in descending key order
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}
