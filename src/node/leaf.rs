use std::fmt::Display;

use super::{encoded_len, split_encoding, Hasher, LEAF_PREFIX};
use crate::error::MalformedNode;

/// A leaf holds the full path of the key it represents and the hash of its value.
/// The value itself lives in the value store, keyed by its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode<const HASH_SIZE: usize> {
    path: [u8; HASH_SIZE],
    value_hash: [u8; HASH_SIZE],
}

impl<const HASH_SIZE: usize> LeafNode<HASH_SIZE> {
    pub fn new(path: [u8; HASH_SIZE], value_hash: [u8; HASH_SIZE]) -> Self {
        Self { path, value_hash }
    }

    /// Creates a leaf for `value`. This function performs a hash.
    pub fn from_value<H: Hasher<HASH_SIZE>>(path: [u8; HASH_SIZE], value: &[u8]) -> Self {
        Self::new(path, H::hash(value))
    }

    pub fn path(&self) -> &[u8; HASH_SIZE] {
        &self.path
    }

    pub fn value_hash(&self) -> &[u8; HASH_SIZE] {
        &self.value_hash
    }

    /// `LEAF_PREFIX ‖ path ‖ value_hash`
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(encoded_len(HASH_SIZE));
        raw.push(LEAF_PREFIX);
        raw.extend_from_slice(&self.path);
        raw.extend_from_slice(&self.value_hash);
        raw
    }

    pub fn decode(raw: &[u8]) -> Result<Self, MalformedNode> {
        match split_encoding::<HASH_SIZE>(raw)? {
            (LEAF_PREFIX, path, value_hash) => Ok(Self { path, value_hash }),
            _ => Err(MalformedNode { len: raw.len() }),
        }
    }

    /// Hash of the leaf encoding. This function performs a hash.
    pub fn hash<H: Hasher<HASH_SIZE>>(&self) -> [u8; HASH_SIZE] {
        H::hash(&self.encode())
    }
}

impl<const HASH_SIZE: usize> Display for LeafNode<HASH_SIZE> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Leaf {{ path: {}, value_hash: {} }}",
            hex::encode(self.path),
            hex::encode(self.value_hash)
        )
    }
}
