//! Proofs are used to verify membership or absence of a key against a root.
//!
//! A proof carries the sibling reference of every inner node on the path from the root
//! to the slot where the key lives or would live, plus what sits in that slot.
//!
//! A proof can be compressed: empty siblings are replaced by a bit in a bitmap.
use bitvec::{order::Msb0, vec::BitVec};

use crate::{
    error::ProofError,
    node::{is_zero, zero_value, Hasher, InnerNode, LeafNode},
    path::{bit_at, common_prefix_len, PathHasher},
};

/// What the proven path ends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofTerminal<const HASH_SIZE: usize> {
    /// The slot is an empty subtree.
    Empty,
    /// The slot holds a leaf. If its path differs from the proven one the proof shows
    /// absence.
    Leaf {
        path: [u8; HASH_SIZE],
        value_hash: [u8; HASH_SIZE],
    },
}

/// A merkle proof for a given key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof<const HASH_SIZE: usize> {
    siblings: Vec<[u8; HASH_SIZE]>,
    terminal: ProofTerminal<HASH_SIZE>,
}

impl<const HASH_SIZE: usize> Proof<HASH_SIZE> {
    /// Creates a proof from siblings in root to leaf order.
    pub fn new(siblings: Vec<[u8; HASH_SIZE]>, terminal: ProofTerminal<HASH_SIZE>) -> Self {
        Self { siblings, terminal }
    }

    pub fn siblings(&self) -> &[[u8; HASH_SIZE]] {
        &self.siblings
    }

    pub fn terminal(&self) -> &ProofTerminal<HASH_SIZE> {
        &self.terminal
    }

    /// Depth of the terminal slot.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Whether the proof ends on a leaf for exactly `path`.
    pub fn is_inclusion(&self, path: &[u8; HASH_SIZE]) -> bool {
        matches!(&self.terminal, ProofTerminal::Leaf { path: leaf_path, .. } if leaf_path == path)
    }

    /// Recomputes the root by hashing from the terminal slot up, following `path`.
    pub fn compute_root<H: Hasher<HASH_SIZE>>(&self, path: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
        let mut current = match self.terminal {
            ProofTerminal::Empty => zero_value(),
            ProofTerminal::Leaf {
                path: leaf_path,
                value_hash,
            } => LeafNode::new(leaf_path, value_hash).hash::<H>(),
        };
        for (depth, sibling) in self.siblings.iter().enumerate().rev() {
            current = InnerNode::from_step(bit_at(path, depth), current, *sibling).hash::<H>();
        }
        current
    }

    /// Verifies the proof for `path` against `root`.
    ///
    /// With `Some(value)` the proof must show that `path` maps to `value`, with `None`
    /// that `path` is absent.
    pub fn verify<H: Hasher<HASH_SIZE>>(
        &self,
        root: &[u8; HASH_SIZE],
        path: &[u8; HASH_SIZE],
        value: Option<&[u8]>,
    ) -> bool {
        let depth = self.depth();
        if depth > HASH_SIZE * 8 {
            return false;
        }
        let terminal_ok = match (&self.terminal, value) {
            (ProofTerminal::Leaf { path: leaf_path, value_hash }, Some(value)) => {
                leaf_path == path && *value_hash == H::hash(value)
            }
            (ProofTerminal::Leaf { path: leaf_path, .. }, None) => {
                // the leaf must sit in the slot the key routes to
                leaf_path != path && common_prefix_len(leaf_path, path) >= depth
            }
            (ProofTerminal::Empty, Some(_)) => false,
            (ProofTerminal::Empty, None) => true,
        };
        terminal_ok && self.compute_root::<H>(path) == *root
    }

    /// Compresses the proof, dropping empty siblings.
    pub fn compress(&self) -> CompressedProof<HASH_SIZE> {
        let mut bits = BitVec::with_capacity(self.siblings.len());
        let mut siblings = Vec::new();
        for sibling in self.siblings.iter() {
            if is_zero(sibling) {
                bits.push(true);
            } else {
                bits.push(false);
                siblings.push(*sibling);
            }
        }
        CompressedProof::new(siblings, bits, self.terminal)
    }
}

/// Verifies `proof` for `key`, deriving its path with `path_hasher`.
pub fn verify_proof<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>>(
    proof: &Proof<HASH_SIZE>,
    root: &[u8; HASH_SIZE],
    key: &[u8],
    value: Option<&[u8]>,
    path_hasher: &dyn PathHasher<HASH_SIZE>,
) -> bool {
    proof.verify::<H>(root, &path_hasher.path(key), value)
}

/// A compressed merkle proof.
/// We don't store the siblings that are empty, a set bit marks them instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedProof<const HASH_SIZE: usize> {
    siblings: Vec<[u8; HASH_SIZE]>,
    bits: BitVec<u8, Msb0>,
    terminal: ProofTerminal<HASH_SIZE>,
}

impl<const HASH_SIZE: usize> CompressedProof<HASH_SIZE> {
    pub fn new(
        siblings: Vec<[u8; HASH_SIZE]>,
        bits: BitVec<u8, Msb0>,
        terminal: ProofTerminal<HASH_SIZE>,
    ) -> Self {
        Self {
            siblings,
            bits,
            terminal,
        }
    }

    /// Decompresses the proof into a proof.
    pub fn decompress(&self) -> Result<Proof<HASH_SIZE>, ProofError> {
        let expected = self.bits.count_zeros();
        if self.siblings.len() != expected {
            return Err(ProofError::SiblingCountMismatch {
                expected,
                got: self.siblings.len(),
            });
        }
        let mut siblings = Vec::with_capacity(self.bits.len());
        let mut next = 0;
        for empty in self.bits.iter().by_vals() {
            if empty {
                siblings.push(zero_value());
            } else {
                siblings.push(self.siblings[next]);
                next += 1;
            }
        }
        Ok(Proof::new(siblings, self.terminal))
    }

    /// Encodes the proof into a byte vector.
    ///
    /// Layout: sibling count (u16 BE), non-empty sibling count (u16 BE), the non-empty
    /// siblings, a terminal tag (`0` empty, `1` leaf followed by path and value hash),
    /// then the bitmap padded to whole bytes with zero bits.
    ///
    /// Fails if the proof is deeper than the tree or the bitmap disagrees with the
    /// carried siblings.
    pub fn encode(&self) -> Result<Vec<u8>, ProofError> {
        let max = (HASH_SIZE * 8).min(u16::MAX as usize);
        if self.bits.len() > max {
            return Err(ProofError::TooManySiblings {
                got: self.bits.len(),
                max,
            });
        }
        let expected = self.bits.count_zeros();
        if self.siblings.len() != expected {
            return Err(ProofError::SiblingCountMismatch {
                expected,
                got: self.siblings.len(),
            });
        }
        let mut encoded = Vec::new();
        encoded.extend_from_slice(&(self.bits.len() as u16).to_be_bytes());
        encoded.extend_from_slice(&(self.siblings.len() as u16).to_be_bytes());
        for sibling in self.siblings.iter() {
            encoded.extend_from_slice(sibling);
        }
        match &self.terminal {
            ProofTerminal::Empty => encoded.push(0),
            ProofTerminal::Leaf { path, value_hash } => {
                encoded.push(1);
                encoded.extend_from_slice(path);
                encoded.extend_from_slice(value_hash);
            }
        }
        let mut bitmap = self.bits.clone();
        bitmap.set_uninitialized(false);
        encoded.extend_from_slice(bitmap.as_raw_slice());
        Ok(encoded)
    }

    /// Decodes a proof from a byte vector.
    pub fn decode(data: &[u8]) -> Result<Self, ProofError> {
        let mut reader = Reader { data, offset: 0 };
        let count = u16::from_be_bytes(reader.take_array()?) as usize;
        if count > HASH_SIZE * 8 {
            return Err(ProofError::TooManySiblings {
                got: count,
                max: HASH_SIZE * 8,
            });
        }
        let non_zero = u16::from_be_bytes(reader.take_array()?) as usize;
        let mut siblings = Vec::with_capacity(non_zero.min(count));
        for _ in 0..non_zero {
            siblings.push(reader.take_array()?);
        }
        let terminal = match reader.take_array::<1>()?[0] {
            0 => ProofTerminal::Empty,
            1 => ProofTerminal::Leaf {
                path: reader.take_array()?,
                value_hash: reader.take_array()?,
            },
            tag => return Err(ProofError::InvalidTerminalTag(tag)),
        };
        let mut bits = BitVec::<u8, Msb0>::from_slice(reader.take((count + 7) / 8)?);
        if reader.remaining() > 0 {
            return Err(ProofError::TrailingBytes(reader.remaining()));
        }
        if bits[count..].any() {
            return Err(ProofError::NonZeroPadding);
        }
        bits.truncate(count);
        let expected = bits.count_zeros();
        if expected != non_zero {
            return Err(ProofError::SiblingCountMismatch {
                expected,
                got: non_zero,
            });
        }
        Ok(Self::new(siblings, bits, terminal))
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], ProofError> {
        let end = self.offset + len;
        let bytes = self.data.get(self.offset..end).ok_or(ProofError::Truncated {
            needed: end,
            got: self.data.len(),
        })?;
        self.offset = end;
        Ok(bytes)
    }

    fn take_array<const LEN: usize>(&mut self) -> Result<[u8; LEN], ProofError> {
        let mut out = [0; LEN];
        out.copy_from_slice(self.take(LEN)?);
        Ok(out)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }
}
