//! Key to path derivation.
//!
//! Every key is routed through the tree by a fixed width path obtained by hashing it.
//! Bit `i` of the path (most significant bit first) selects the child taken at depth
//! `i`: `0` goes left, `1` goes right.

use std::marker::PhantomData;

use bitvec::{order::Msb0, view::BitView};

use crate::{db::ThreadSafe, node::Hasher};

/// Derives the fixed width path of a key.
pub trait PathHasher<const HASH_SIZE: usize>: ThreadSafe {
    fn path(&self, key: &[u8]) -> [u8; HASH_SIZE];
}

/// Any thread safe closure can be used as a path hasher.
impl<const HASH_SIZE: usize, F> PathHasher<HASH_SIZE> for F
where
    F: Fn(&[u8]) -> [u8; HASH_SIZE] + ThreadSafe,
{
    fn path(&self, key: &[u8]) -> [u8; HASH_SIZE] {
        self(key)
    }
}

/// Path hasher used unless configured otherwise: the tree hash function applied to
/// the key.
pub struct DefaultPathHasher<H>(PhantomData<fn() -> H>);

impl<H> DefaultPathHasher<H> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<H> Default for DefaultPathHasher<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> PathHasher<HASH_SIZE> for DefaultPathHasher<H> {
    fn path(&self, key: &[u8]) -> [u8; HASH_SIZE] {
        H::hash(key)
    }
}

/// Get the bit at the given depth in the path, most significant bit first.
pub fn bit_at(path: &[u8], index: usize) -> bool {
    path.view_bits::<Msb0>()[index]
}

/// Number of leading bits shared by both paths.
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.view_bits::<Msb0>()
        .iter()
        .by_vals()
        .zip(b.view_bits::<Msb0>().iter().by_vals())
        .take_while(|(left, right)| left == right)
        .count()
}
