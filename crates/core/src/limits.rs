//! Size limits for values and atomic batches
//!
//! These constants are part of the persisted layout contract: documents
//! sharded under one `SEGMENT_VALUE_LIMIT` must stay readable by builds
//! using the same value.

/// Per-segment ceiling in bytes for large-document chunks
///
/// The underlying store bounds individual values; serialized documents
/// larger than this are sliced into sequential segments of at most this
/// many bytes.
pub const SEGMENT_VALUE_LIMIT: usize = 64 * 1024;

/// Maximum mutations accepted by the store in one atomic batch
///
/// Longer operation lists are split across several batches by
/// `commit_in_batches`, giving up cross-batch atomicity.
pub const MAX_MUTATIONS_PER_BATCH: usize = 1_000;

/// Maximum version checks accepted by the store in one atomic batch
pub const MAX_CHECKS_PER_BATCH: usize = 100;
