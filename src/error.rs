//! The two error kinds raised by this crate.
//!
//! [`MerkleError::InvalidArgument`] reports something the caller supplied that is
//! malformed; it is recoverable by the caller. [`MerkleError::Invariant`] reports
//! something the library asserts about its own state that turned out false — a
//! loaded tree that fails shape validation, or a proof that does not re-verify
//! against the tree it was generated from. These indicate tampering or a library
//! bug, not a usage mistake.

use thiserror::Error;

/// Error type shared by every fallible operation in this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// The caller supplied something malformed: an empty leaf set, a non-leaf
    /// index, a duplicated multiproof index, a leaf absent from the tree, a
    /// malformed dump, or a `node_hash` mismatch between dump and loader.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A self-check inside the library failed: a loaded tree fails
    /// [`crate::engine::is_valid_merkle_tree`], or a proof this crate just
    /// generated does not verify against its own root.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl MerkleError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        MerkleError::InvalidArgument(msg.into())
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        MerkleError::Invariant(msg.into())
    }
}
