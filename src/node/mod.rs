mod inner;
mod leaf;

use sha2::{Digest, Sha256};
use std::fmt::Display;

pub use inner::InnerNode;
pub use leaf::LeafNode;

use crate::error::MalformedNode;

/// Prefix byte of a leaf encoding.
pub const LEAF_PREFIX: u8 = 0x00;
/// Prefix byte of an inner node encoding.
pub const INNER_PREFIX: u8 = 0x01;

impl Hasher<32> for Sha256 {
    fn hash(data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().into()
    }
}

/// Simple hash trait required to hash the nodes in the tree
///
/// # Type Parameters
/// * `HASH_SIZE` - The size of the hash digest in bytes
pub trait Hasher<const HASH_SIZE: usize> {
    fn hash(data: &[u8]) -> [u8; HASH_SIZE];
}

/// Length in bytes of both node encodings: one prefix byte and two digests.
pub const fn encoded_len(hash_size: usize) -> usize {
    1 + 2 * hash_size
}

/// The reserved reference meaning "empty subtree".
pub const fn zero_value<const HASH_SIZE: usize>() -> [u8; HASH_SIZE] {
    [0; HASH_SIZE]
}

pub fn is_zero(reference: &[u8]) -> bool {
    reference.iter().all(|byte| *byte == 0)
}

/// Returns true iff `raw` carries the leaf prefix. The inner encoding can never start
/// with [`LEAF_PREFIX`], so this needs no other context.
pub fn is_leaf(raw: &[u8]) -> bool {
    raw.first() == Some(&LEAF_PREFIX)
}

/// Decodes the child references of an inner node encoding.
pub fn parse_node<const HASH_SIZE: usize>(
    raw: &[u8],
) -> Result<([u8; HASH_SIZE], [u8; HASH_SIZE]), MalformedNode> {
    InnerNode::decode(raw).map(|inner| (*inner.left(), *inner.right()))
}

/// Decodes the path and value hash of a leaf encoding.
pub fn parse_leaf<const HASH_SIZE: usize>(
    raw: &[u8],
) -> Result<([u8; HASH_SIZE], [u8; HASH_SIZE]), MalformedNode> {
    LeafNode::decode(raw).map(|leaf| (*leaf.path(), *leaf.value_hash()))
}

/// Digest of a raw node encoding.
pub fn digest<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>>(raw: &[u8]) -> [u8; HASH_SIZE] {
    H::hash(raw)
}

/// Splits a fixed-width encoding into its prefix byte and its two digest halves.
pub(crate) fn split_encoding<const HASH_SIZE: usize>(
    raw: &[u8],
) -> Result<(u8, [u8; HASH_SIZE], [u8; HASH_SIZE]), MalformedNode> {
    if raw.len() != encoded_len(HASH_SIZE) {
        return Err(MalformedNode { len: raw.len() });
    }
    let mut first = [0; HASH_SIZE];
    let mut second = [0; HASH_SIZE];
    first.copy_from_slice(&raw[1..1 + HASH_SIZE]);
    second.copy_from_slice(&raw[1 + HASH_SIZE..]);
    Ok((raw[0], first, second))
}

/// All node variants that can be persisted in the node store. An empty subtree is
/// never stored; it is the zero value reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<const HASH_SIZE: usize> {
    Leaf(LeafNode<HASH_SIZE>),
    Inner(InnerNode<HASH_SIZE>),
}

impl<const HASH_SIZE: usize> Node<HASH_SIZE> {
    /// Decodes a raw node, discriminating on the prefix byte.
    pub fn decode(raw: &[u8]) -> Result<Self, MalformedNode> {
        match raw.first() {
            Some(&LEAF_PREFIX) => LeafNode::decode(raw).map(Self::Leaf),
            Some(&INNER_PREFIX) => InnerNode::decode(raw).map(Self::Inner),
            _ => Err(MalformedNode { len: raw.len() }),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Leaf(leaf) => leaf.encode(),
            Self::Inner(inner) => inner.encode(),
        }
    }

    /// Hashes the canonical encoding of the node.
    pub fn hash<H: Hasher<HASH_SIZE>>(&self) -> [u8; HASH_SIZE] {
        H::hash(&self.encode())
    }
}

impl<const HASH_SIZE: usize> Display for Node<HASH_SIZE> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(leaf) => write!(f, "{}", leaf),
            Self::Inner(inner) => write!(f, "{}", inner),
        }
    }
}
