//! Pre-order traversal of every stored node reachable from a root.
//!
//! The cursor keeps an explicit stack of frames, one per node between the root and
//! the current position, so depth is bounded by the path width and nothing recurses.
//! A store whose nodes nest deeper than that ends the traversal with
//! [`TreeError::MalformedNode`].

use log::{trace, warn};

use crate::{
    node::{is_leaf, is_zero, parse_node, Hasher, LeafNode, Node},
    SparseMerkleTree, TreeError,
};

const LOG_TARGET: &str = "kvsmt::iterator";

struct Frame<const HASH_SIZE: usize> {
    digest: [u8; HASH_SIZE],
    raw: Vec<u8>,
    left_visited: bool,
    right_visited: bool,
}

/// Cursor over the nodes of a tree at a fixed root.
///
/// Call [`advance`](Self::advance) before reading the first node. Once it returns
/// `false` the cursor is done; [`error`](Self::error) tells a clean end
/// ([`TreeError::IteratorEnd`]) from a failure.
pub struct TreeIterator<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError> {
    tree: SparseMerkleTree<HASH_SIZE, H, DbError>,
    stack: Vec<Frame<HASH_SIZE>>,
    state: Option<TreeError<DbError>>,
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError> TreeIterator<HASH_SIZE, H, DbError> {
    fn new(tree: SparseMerkleTree<HASH_SIZE, H, DbError>) -> Self {
        Self {
            tree,
            stack: Vec::new(),
            state: None,
        }
    }

    /// The root being traversed.
    pub fn root(&self) -> [u8; HASH_SIZE] {
        self.tree.root()
    }

    /// Moves to the next node in pre-order, left before right. Returns `false` once
    /// every node has been visited or a failure occurred.
    pub fn advance(&mut self) -> bool {
        if self.state.is_some() {
            return false;
        }
        match self.step() {
            Ok(()) => true,
            Err(err) => {
                if !err.is_iterator_end() {
                    warn!(
                        target: LOG_TARGET,
                        "Traversal of root {} stopped at depth {}",
                        hex::encode(self.tree.root()),
                        self.stack.len()
                    );
                }
                self.stack.clear();
                self.state = Some(err);
                false
            }
        }
    }

    fn step(&mut self) -> Result<(), TreeError<DbError>> {
        if self.stack.is_empty() {
            let root = self.tree.root();
            if is_zero(&root) {
                return Err(TreeError::IteratorEnd);
            }
            return self.push(root);
        }
        while let Some(top) = self.stack.last_mut() {
            if is_leaf(&top.raw) {
                self.stack.pop();
                continue;
            }
            let (left, right) = parse_node::<HASH_SIZE>(&top.raw)
                .map_err(|err| err.at::<DbError>(&top.digest))?;
            let child = if !top.left_visited {
                top.left_visited = true;
                left
            } else if !top.right_visited {
                top.right_visited = true;
                right
            } else {
                self.stack.pop();
                continue;
            };
            if !is_zero(&child) {
                return self.push(child);
            }
        }
        Err(TreeError::IteratorEnd)
    }

    fn push(&mut self, digest: [u8; HASH_SIZE]) -> Result<(), TreeError<DbError>> {
        let raw = self.tree.fetch_node(&digest)?;
        Node::<HASH_SIZE>::decode(&raw).map_err(|err| err.at::<DbError>(&digest))?;
        // a path crosses at most max_depth inner nodes before its leaf
        if self.stack.len() == SparseMerkleTree::<HASH_SIZE, H, DbError>::max_depth() + 1 {
            return Err(TreeError::MalformedNode {
                digest: digest.to_vec(),
                len: raw.len(),
            });
        }
        trace!(
            target: LOG_TARGET,
            "Visiting {} at depth {}",
            hex::encode(digest),
            self.stack.len()
        );
        self.stack.push(Frame {
            digest,
            raw,
            left_visited: false,
            right_visited: false,
        });
        Ok(())
    }

    /// Whether the current node is a leaf. `false` when there is no current node.
    pub fn is_leaf(&self) -> bool {
        self.stack.last().map_or(false, |frame| is_leaf(&frame.raw))
    }

    /// Raw encoding of the current node, empty when there is no current node.
    pub fn node_blob(&self) -> &[u8] {
        self.stack
            .last()
            .map(|frame| frame.raw.as_slice())
            .unwrap_or_default()
    }

    pub fn node_digest(&self) -> Option<[u8; HASH_SIZE]> {
        self.stack.last().map(|frame| frame.digest)
    }

    /// Depth of the current node, the root being at depth 0.
    pub fn depth(&self) -> Option<usize> {
        self.stack.len().checked_sub(1)
    }

    fn leaf(&self) -> Option<LeafNode<HASH_SIZE>> {
        self.stack
            .last()
            .filter(|frame| is_leaf(&frame.raw))
            .and_then(|frame| LeafNode::decode(&frame.raw).ok())
    }

    /// Path stored in the current leaf.
    pub fn leaf_key(&self) -> Option<[u8; HASH_SIZE]> {
        self.leaf().map(|leaf| *leaf.path())
    }

    /// Value of the current leaf, read from the value store.
    pub fn leaf_value(&self) -> Result<Option<Vec<u8>>, TreeError<DbError>> {
        self.leaf()
            .map(|leaf| self.tree.fetch_value(&leaf))
            .transpose()
    }

    /// How the traversal ended, `None` while it is still running.
    pub fn error(&self) -> Option<&TreeError<DbError>> {
        self.state.as_ref()
    }

    /// Whether every node has been visited without failure.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, Some(TreeError::IteratorEnd))
    }
}

/// Every `(path, value)` pair of a tree, in path order.
pub struct Leaves<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError> {
    inner: TreeIterator<HASH_SIZE, H, DbError>,
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError> Iterator for Leaves<HASH_SIZE, H, DbError> {
    type Item = Result<([u8; HASH_SIZE], Vec<u8>), TreeError<DbError>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.inner.advance() {
            let Some(leaf) = self.inner.leaf() else {
                continue;
            };
            return match self.inner.tree.fetch_value(&leaf) {
                Ok(value) => Some(Ok((*leaf.path(), value))),
                Err(err) => {
                    self.inner.stack.clear();
                    self.inner.state = Some(TreeError::IteratorEnd);
                    Some(Err(err))
                }
            };
        }
        // hand the failure out once, leaving a clean end behind
        match self.inner.state.replace(TreeError::IteratorEnd) {
            Some(TreeError::IteratorEnd) | None => None,
            Some(err) => Some(Err(err)),
        }
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError> SparseMerkleTree<HASH_SIZE, H, DbError> {
    /// Cursor over the nodes reachable from the current root. Later mutations of this
    /// handle do not affect it.
    pub fn iter(&self) -> TreeIterator<HASH_SIZE, H, DbError> {
        TreeIterator::new(self.at_root(self.root()))
    }

    /// Every stored key path with its value.
    pub fn leaves(&self) -> Leaves<HASH_SIZE, H, DbError> {
        Leaves { inner: self.iter() }
    }
}
