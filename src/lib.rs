//! Sparse Merkle tree index over pluggable key-value stores
//!
//! This crate provides a sparse Merkle tree with compressed leaves: every key is hashed
//! into a fixed width path and its leaf sits at the shallowest depth where no other key
//! shares the subtree, so the root only depends on the set of pairs stored.
//!
//! The tree supports:
//! - Get, update and delete with copy-on-write, old roots stay readable
//! - Inclusion and exclusion proofs, with a compressed wire encoding
//! - Pre-order iteration over every stored node
//! - Flexible storage backend through the `Store` trait

mod db;
mod error;
pub mod iterator;
pub mod node;
pub mod path;
pub mod proof;
mod tree;

pub use db::{MemoryStore, SharedStore, Store, ThreadSafe};
pub use error::{MalformedNode, ProofError, TreeError};
pub use iterator::{Leaves, TreeIterator};
pub use node::{Hasher, InnerNode, LeafNode, Node};
pub use path::{DefaultPathHasher, PathHasher};
pub use proof::{verify_proof, CompressedProof, Proof, ProofTerminal};
pub use tree::{set_path_hasher, SparseMerkleTree, TreeBuilder, TreeConfig, TreeOption};

#[cfg(test)]
mod tests;
