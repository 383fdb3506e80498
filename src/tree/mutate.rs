//! Copy-on-write mutations.
//!
//! Mutations stage every new node encoding in memory, bottom-up, then write them to
//! the node store children first and only then move the root. A store failure in the
//! middle leaves the committed root untouched; already written nodes are orphans the
//! caller may reclaim.

use log::{debug, trace};

use crate::{
    node::{is_zero, zero_value, Hasher, InnerNode, LeafNode, Node},
    path::{bit_at, common_prefix_len},
    TreeError,
};

use super::{SparseMerkleTree, Terminal, LOG_TARGET};

/// Node encodings waiting to be written, children before parents.
struct Staged<const HASH_SIZE: usize> {
    writes: Vec<([u8; HASH_SIZE], Vec<u8>)>,
}

impl<const HASH_SIZE: usize> Staged<HASH_SIZE> {
    fn new() -> Self {
        Self { writes: Vec::new() }
    }

    /// Encodes and hashes `node`, returning its digest.
    fn push<H: Hasher<HASH_SIZE>>(&mut self, node: Node<HASH_SIZE>) -> [u8; HASH_SIZE] {
        let raw = node.encode();
        let digest = H::hash(&raw);
        self.writes.push((digest, raw));
        digest
    }

    fn inner<H: Hasher<HASH_SIZE>>(
        &mut self,
        bit: bool,
        current: [u8; HASH_SIZE],
        sibling: [u8; HASH_SIZE],
    ) -> [u8; HASH_SIZE] {
        self.push::<H>(Node::Inner(InnerNode::from_step(bit, current, sibling)))
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError> SparseMerkleTree<HASH_SIZE, H, DbError> {
    /// Sets `value` for `key` and returns the new root.
    ///
    /// Writing the value a key already holds still rebuilds the path; the resulting
    /// root is identical to the current one.
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<[u8; HASH_SIZE], TreeError<DbError>> {
        let path = self.path(key);
        let leaf = LeafNode::from_value::<H>(path, value);
        let value_hash = *leaf.value_hash();
        let descent = self.walk_down(&path)?;
        let depth = descent.siblings.len();

        let mut staged = Staged::new();
        let mut current = staged.push::<H>(Node::Leaf(leaf));

        if let Terminal::Leaf {
            digest,
            leaf: existing,
        } = &descent.terminal
        {
            if existing.path() != &path {
                // Both paths agree down to `depth`; separate them at the first
                // differing bit and pad the shared stretch with empty siblings.
                let split = common_prefix_len(&path, existing.path());
                trace!(
                    target: LOG_TARGET,
                    "Splitting leaf {} at depth {} (slot depth {})",
                    hex::encode(existing.path()),
                    split,
                    depth
                );
                current = staged.inner::<H>(bit_at(&path, split), current, *digest);
                for d in (depth..split).rev() {
                    current = staged.inner::<H>(bit_at(&path, d), current, zero_value());
                }
            }
        }

        for (d, sibling) in descent.siblings.iter().enumerate().rev() {
            current = staged.inner::<H>(bit_at(&path, d), current, *sibling);
        }

        self.commit(staged, Some((value_hash, value)), current)
    }

    /// Removes `key` and returns the new root. Fails with
    /// [`TreeError::KeyNotFound`] and leaves the tree unchanged if the key is absent.
    ///
    /// The vacated slot is collapsed upward: as long as the remaining subtree is empty
    /// or a single leaf and its sibling is empty, the parent disappears and the leaf
    /// moves up a level.
    pub fn delete(&mut self, key: &[u8]) -> Result<[u8; HASH_SIZE], TreeError<DbError>> {
        let path = self.path(key);
        let descent = self.walk_down(&path)?;
        match &descent.terminal {
            Terminal::Leaf { leaf, .. } if leaf.path() == &path => {}
            _ => {
                debug!(target: LOG_TARGET, "Cannot delete absent path {}", hex::encode(path));
                return Err(TreeError::KeyNotFound {
                    path: path.to_vec(),
                });
            }
        }

        let mut staged = Staged::new();
        let mut current = zero_value::<HASH_SIZE>();
        let mut collapsing = true;
        for (d, sibling) in descent.siblings.iter().enumerate().rev() {
            if collapsing {
                if is_zero(sibling) {
                    continue;
                }
                if is_zero(&current) && self.is_leaf_ref(sibling)? {
                    trace!(target: LOG_TARGET, "Lifting sibling leaf above depth {}", d);
                    current = *sibling;
                    continue;
                }
                collapsing = false;
            }
            current = staged.inner::<H>(bit_at(&path, d), current, *sibling);
        }

        self.commit(staged, None, current)
    }

    /// Persists staged nodes and the value, then publishes `root`.
    fn commit(
        &mut self,
        staged: Staged<HASH_SIZE>,
        value: Option<([u8; HASH_SIZE], &[u8])>,
        root: [u8; HASH_SIZE],
    ) -> Result<[u8; HASH_SIZE], TreeError<DbError>> {
        if let Some((value_hash, value)) = value {
            self.values()
                .put(&value_hash, value.to_vec())
                .map_err(TreeError::Store)?;
        }
        let written = staged.writes.len();
        for (digest, raw) in staged.writes {
            self.nodes().put(&digest, raw).map_err(TreeError::Store)?;
        }
        debug!(
            target: LOG_TARGET,
            "Root moved {} -> {} ({} new nodes)",
            hex::encode(self.root),
            hex::encode(root),
            written
        );
        self.root = root;
        Ok(root)
    }
}
