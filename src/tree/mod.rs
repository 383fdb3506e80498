//! Core sparse Merkle tree implementation

mod config;
mod mutate;

use std::marker::PhantomData;

use log::{debug, warn};

pub use config::{set_path_hasher, TreeBuilder, TreeConfig, TreeOption};

use crate::{
    db::SharedStore,
    node::{is_zero, zero_value, Hasher, LeafNode, Node},
    path::bit_at,
    proof::{Proof, ProofTerminal},
    TreeError,
};

const LOG_TARGET: &str = "kvsmt::tree";

/// Sparse Merkle tree over a node store and a value store.
/// * `HASH_SIZE` - size of the hash digest in bytes, paths are `HASH_SIZE * 8` bits.
/// * `H` - Hasher that will be used to hash nodes and values.
/// * `DbError` - error type of the stores.
///
/// Every mutation writes new nodes and moves the root; stored nodes are never
/// modified, so any previously returned root stays readable through [`Self::at_root`]
/// for as long as the stores retain its nodes.
pub struct SparseMerkleTree<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError> {
    nodes: SharedStore<DbError>,
    values: SharedStore<DbError>,
    config: TreeConfig<HASH_SIZE>,
    root: [u8; HASH_SIZE],
    _phantom: PhantomData<fn() -> H>,
}

/// What a descent along a path ends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Terminal<const HASH_SIZE: usize> {
    Empty,
    Leaf {
        digest: [u8; HASH_SIZE],
        leaf: LeafNode<HASH_SIZE>,
    },
}

/// Result of walking down the tree: the siblings of every inner node crossed, in
/// root to leaf order, and the terminal slot.
#[derive(Debug, Clone)]
pub(crate) struct Descent<const HASH_SIZE: usize> {
    pub(crate) siblings: Vec<[u8; HASH_SIZE]>,
    pub(crate) terminal: Terminal<HASH_SIZE>,
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE> + 'static, DbError>
    SparseMerkleTree<HASH_SIZE, H, DbError>
{
    /// Creates an empty tree with the default configuration.
    pub fn new(nodes: SharedStore<DbError>, values: SharedStore<DbError>) -> Self {
        Self::with_options(nodes, values, [])
    }

    /// Creates an empty tree, applying `options` to the default configuration.
    pub fn with_options(
        nodes: SharedStore<DbError>,
        values: SharedStore<DbError>,
        options: impl IntoIterator<Item = TreeOption<HASH_SIZE>>,
    ) -> Self {
        let config = TreeConfig::new::<H>().apply(options);
        Self::from_parts(nodes, values, config, zero_value())
    }

    /// Opens a tree at a root previously produced over the same stores.
    ///
    /// `options` must configure the same path hasher the root was built with, otherwise
    /// keys route to the wrong leaves.
    pub fn import(
        nodes: SharedStore<DbError>,
        values: SharedStore<DbError>,
        root: [u8; HASH_SIZE],
        options: impl IntoIterator<Item = TreeOption<HASH_SIZE>>,
    ) -> Self {
        let config = TreeConfig::new::<H>().apply(options);
        Self::from_parts(nodes, values, config, root)
    }

    pub fn builder(
        nodes: SharedStore<DbError>,
        values: SharedStore<DbError>,
    ) -> TreeBuilder<HASH_SIZE, H, DbError> {
        TreeBuilder::new(nodes, values)
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError> SparseMerkleTree<HASH_SIZE, H, DbError> {
    pub(crate) fn from_parts(
        nodes: SharedStore<DbError>,
        values: SharedStore<DbError>,
        config: TreeConfig<HASH_SIZE>,
        root: [u8; HASH_SIZE],
    ) -> Self {
        Self {
            nodes,
            values,
            config,
            root,
            _phantom: PhantomData,
        }
    }

    /// A second handle on the same stores and configuration, positioned at `root`.
    pub fn at_root(&self, root: [u8; HASH_SIZE]) -> Self {
        Self::from_parts(
            self.nodes.clone(),
            self.values.clone(),
            self.config.clone(),
            root,
        )
    }

    /// Max depth of the tree
    pub const fn max_depth() -> usize {
        HASH_SIZE * 8
    }

    /// Current root digest, the zero value if the tree is empty.
    pub fn root(&self) -> [u8; HASH_SIZE] {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        is_zero(&self.root)
    }

    pub fn config(&self) -> &TreeConfig<HASH_SIZE> {
        &self.config
    }

    pub(crate) fn nodes(&self) -> &SharedStore<DbError> {
        &self.nodes
    }

    pub(crate) fn values(&self) -> &SharedStore<DbError> {
        &self.values
    }

    /// Path of `key` under the configured path hasher.
    pub fn path(&self, key: &[u8]) -> [u8; HASH_SIZE] {
        self.config.path_hasher().path(key)
    }

    /// Fetches a node encoding. `digest` must not be the zero value.
    pub(crate) fn fetch_node(&self, digest: &[u8; HASH_SIZE]) -> Result<Vec<u8>, TreeError<DbError>> {
        match self.nodes.get(digest).map_err(TreeError::Store)? {
            Some(raw) => Ok(raw),
            None => {
                warn!(
                    target: LOG_TARGET,
                    "Node {} referenced by root {} is missing from the node store",
                    hex::encode(digest),
                    hex::encode(self.root)
                );
                Err(TreeError::NodeNotFound {
                    digest: digest.to_vec(),
                })
            }
        }
    }

    /// Fetches the value a leaf commits to.
    pub(crate) fn fetch_value(&self, leaf: &LeafNode<HASH_SIZE>) -> Result<Vec<u8>, TreeError<DbError>> {
        match self.values.get(leaf.value_hash()).map_err(TreeError::Store)? {
            Some(value) => Ok(value),
            None => {
                warn!(
                    target: LOG_TARGET,
                    "Value {} of leaf {} is missing from the value store",
                    hex::encode(leaf.value_hash()),
                    hex::encode(leaf.path())
                );
                Err(TreeError::ValueNotFound {
                    path: leaf.path().to_vec(),
                })
            }
        }
    }

    /// Whether a non zero reference points at a well formed leaf.
    pub(crate) fn is_leaf_ref(&self, digest: &[u8; HASH_SIZE]) -> Result<bool, TreeError<DbError>> {
        let raw = self.fetch_node(digest)?;
        let node: Node<HASH_SIZE> = Node::decode(&raw).map_err(|err| err.at::<DbError>(digest))?;
        Ok(matches!(node, Node::Leaf(_)))
    }

    /// Walk down the tree from the root following `path` until an empty slot or a
    /// leaf is reached, collecting the sibling of every step.
    pub(crate) fn walk_down(&self, path: &[u8; HASH_SIZE]) -> Result<Descent<HASH_SIZE>, TreeError<DbError>> {
        let mut siblings = Vec::new();
        let mut current = self.root;
        loop {
            if is_zero(&current) {
                return Ok(Descent {
                    siblings,
                    terminal: Terminal::Empty,
                });
            }
            let raw = self.fetch_node(&current)?;
            match Node::decode(&raw).map_err(|err| err.at::<DbError>(&current))? {
                Node::Leaf(leaf) => {
                    return Ok(Descent {
                        siblings,
                        terminal: Terminal::Leaf {
                            digest: current,
                            leaf,
                        },
                    })
                }
                Node::Inner(inner) => {
                    let depth = siblings.len();
                    // an inner node below the last path bit cannot be routed
                    if depth == Self::max_depth() {
                        return Err(TreeError::MalformedNode {
                            digest: current.to_vec(),
                            len: raw.len(),
                        });
                    }
                    let (next, sibling) = inner.step(bit_at(path, depth));
                    siblings.push(sibling);
                    current = next;
                }
            }
        }
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, TreeError<DbError>> {
        let path = self.path(key);
        match self.walk_down(&path)?.terminal {
            Terminal::Leaf { leaf, .. } if leaf.path() == &path => self.fetch_value(&leaf),
            _ => {
                debug!(target: LOG_TARGET, "Path {} not found", hex::encode(path));
                Err(TreeError::KeyNotFound {
                    path: path.to_vec(),
                })
            }
        }
    }

    /// Returns whether `key` is present, without reading the value store.
    pub fn has(&self, key: &[u8]) -> Result<bool, TreeError<DbError>> {
        let path = self.path(key);
        Ok(matches!(
            self.walk_down(&path)?.terminal,
            Terminal::Leaf { leaf, .. } if leaf.path() == &path
        ))
    }

    /// Builds an inclusion proof if `key` is present, an exclusion proof otherwise.
    pub fn prove(&self, key: &[u8]) -> Result<Proof<HASH_SIZE>, TreeError<DbError>> {
        let descent = self.walk_down(&self.path(key))?;
        let terminal = match descent.terminal {
            Terminal::Empty => ProofTerminal::Empty,
            Terminal::Leaf { leaf, .. } => ProofTerminal::Leaf {
                path: *leaf.path(),
                value_hash: *leaf.value_hash(),
            },
        };
        Ok(Proof::new(descent.siblings, terminal))
    }

    /// Verifies `proof` for `key` against `root`, deriving the path with this tree's
    /// path hasher. `value` is the claimed value, `None` to check absence.
    pub fn verify_proof(
        &self,
        proof: &Proof<HASH_SIZE>,
        root: &[u8; HASH_SIZE],
        key: &[u8],
        value: Option<&[u8]>,
    ) -> bool {
        proof.verify::<H>(root, &self.path(key), value)
    }
}
