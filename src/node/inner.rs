use std::fmt::Display;

use super::{encoded_len, is_zero, split_encoding, Hasher, INNER_PREFIX};
use crate::error::MalformedNode;

/// An inner node has exactly 2 child references. Each one is either the digest of a
/// stored node or the zero value for an empty subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerNode<const HASH_SIZE: usize> {
    left: [u8; HASH_SIZE],
    right: [u8; HASH_SIZE],
}

impl<const HASH_SIZE: usize> InnerNode<HASH_SIZE> {
    pub fn new(left: [u8; HASH_SIZE], right: [u8; HASH_SIZE]) -> Self {
        Self { left, right }
    }

    /// Orders `current` and `sibling` according to the path bit of the step:
    /// bit 0 puts `current` on the left.
    pub fn from_step(bit: bool, current: [u8; HASH_SIZE], sibling: [u8; HASH_SIZE]) -> Self {
        if bit {
            Self::new(sibling, current)
        } else {
            Self::new(current, sibling)
        }
    }

    pub fn left(&self) -> &[u8; HASH_SIZE] {
        &self.left
    }

    pub fn right(&self) -> &[u8; HASH_SIZE] {
        &self.right
    }

    /// Returns the left and right children references.
    pub fn children(&self) -> (&[u8; HASH_SIZE], &[u8; HASH_SIZE]) {
        (&self.left, &self.right)
    }

    /// Returns `(next, sibling)` for the given path bit.
    pub fn step(&self, bit: bool) -> ([u8; HASH_SIZE], [u8; HASH_SIZE]) {
        if bit {
            (self.right, self.left)
        } else {
            (self.left, self.right)
        }
    }

    pub fn is_empty(&self) -> bool {
        is_zero(&self.left) && is_zero(&self.right)
    }

    /// `INNER_PREFIX ‖ left ‖ right`
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(encoded_len(HASH_SIZE));
        raw.push(INNER_PREFIX);
        raw.extend_from_slice(&self.left);
        raw.extend_from_slice(&self.right);
        raw
    }

    pub fn decode(raw: &[u8]) -> Result<Self, MalformedNode> {
        match split_encoding::<HASH_SIZE>(raw)? {
            (INNER_PREFIX, left, right) => Ok(Self { left, right }),
            _ => Err(MalformedNode { len: raw.len() }),
        }
    }

    /// Hash of the inner node encoding. This function performs a hash.
    pub fn hash<H: Hasher<HASH_SIZE>>(&self) -> [u8; HASH_SIZE] {
        H::hash(&self.encode())
    }
}

impl<const HASH_SIZE: usize> Display for InnerNode<HASH_SIZE> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Inner {{ left: {}, right: {} }}",
            hex::encode(self.left),
            hex::encode(self.right)
        )
    }
}
