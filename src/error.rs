//! Error types for the sparse Merkle tree.

use thiserror::Error;

/// Error type for tree operations.
///
/// `DbError` is the error type shared by the node store and the value store backing
/// the tree. Store failures are passed through unchanged in [`TreeError::Store`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError<DbError> {
    /// The key is not present in the tree.
    #[error("key not found (path {})", hex::encode(.path))]
    KeyNotFound { path: Vec<u8> },
    /// A node referenced by the tree is missing from the node store.
    #[error("node {} not found in node store", hex::encode(.digest))]
    NodeNotFound { digest: Vec<u8> },
    /// A leaf references a value missing from the value store.
    #[error("value for path {} not found in value store", hex::encode(.path))]
    ValueNotFound { path: Vec<u8> },
    /// Stored bytes are neither a leaf nor an inner node encoding.
    #[error("malformed node {} ({len} bytes)", hex::encode(.digest))]
    MalformedNode { digest: Vec<u8>, len: usize },
    /// The iterator has visited every node. Not a failure.
    #[error("iterator end")]
    IteratorEnd,
    /// Failure reported by the node store or the value store.
    #[error("store failure: {0}")]
    Store(DbError),
}

impl<DbError> TreeError<DbError> {
    /// True for every "not found" flavour: missing key, node or value.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TreeError::KeyNotFound { .. }
                | TreeError::NodeNotFound { .. }
                | TreeError::ValueNotFound { .. }
        )
    }

    pub fn is_iterator_end(&self) -> bool {
        matches!(self, TreeError::IteratorEnd)
    }
}

/// Raw bytes that match neither the leaf nor the inner node encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("malformed node encoding ({len} bytes)")]
pub struct MalformedNode {
    pub len: usize,
}

impl MalformedNode {
    /// Attaches the digest the bytes were fetched under.
    pub(crate) fn at<DbError>(self, digest: &[u8]) -> TreeError<DbError> {
        TreeError::MalformedNode {
            digest: digest.to_vec(),
            len: self.len,
        }
    }
}

/// Error returned when decoding a [`CompressedProof`](crate::CompressedProof).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("proof encoding truncated: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
    #[error("{0} trailing bytes after proof")]
    TrailingBytes(usize),
    #[error("invalid proof terminal tag {0}")]
    InvalidTerminalTag(u8),
    #[error("bitmap marks {expected} non-empty siblings but proof carries {got}")]
    SiblingCountMismatch { expected: usize, got: usize },
    #[error("proof has {got} siblings, tree depth is {max}")]
    TooManySiblings { got: usize, max: usize },
    #[error("proof bitmap has non-zero padding bits")]
    NonZeroPadding,
}
