//! Versionstamps
//!
//! A versionstamp is the store's per-key CAS token: opaque to callers,
//! minted by the store at commit time, monotonically increasing across
//! commits. Every operation in one committed atomic batch carries the same
//! versionstamp.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, monotonically increasing commit token
///
/// Only the store mints versionstamps; the layer above compares them for
/// equality (CAS checks) and surfaces them in commit results. The rendered
/// form is fixed-width and zero-padded so string ordering matches commit
/// ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Versionstamp(u64);

impl Versionstamp {
    /// Build a versionstamp from a store-assigned sequence number
    pub fn from_sequence(sequence: u64) -> Self {
        Self(sequence)
    }

    /// The underlying sequence number
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Versionstamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:020}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_sequence() {
        assert!(Versionstamp::from_sequence(1) < Versionstamp::from_sequence(2));
    }

    #[test]
    fn test_display_is_fixed_width_and_order_preserving() {
        let a = Versionstamp::from_sequence(9).to_string();
        let b = Versionstamp::from_sequence(10).to_string();
        assert_eq!(a.len(), 20);
        assert_eq!(b.len(), 20);
        assert!(a < b, "rendered form must preserve commit order");
    }

    #[test]
    fn test_serde_roundtrip() {
        let vs = Versionstamp::from_sequence(12345);
        let json = serde_json::to_string(&vs).unwrap();
        let back: Versionstamp = serde_json::from_str(&json).unwrap();
        assert_eq!(vs, back);
    }
}
