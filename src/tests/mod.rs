mod sha512;
mod store;
mod tree;

use crate::{
    path::{bit_at, common_prefix_len},
    Hasher, SparseMerkleTree,
};

/// Keys and values of the reference tree shared by the scenario tests.
pub(crate) const NINE_KEYS: [(&str, &str); 9] = [
    ("aardvark", "c"),
    ("bar", "b"),
    ("barb", "bd"),
    ("bars", "be"),
    ("fab", "z"),
    ("foo", "a"),
    ("foos", "aa"),
    ("food", "ab"),
    ("jars", "d"),
];

/// Number of inner nodes a canonical tree over `paths` must hold: one per prefix
/// shared by at least two paths.
pub(crate) fn shared_prefix_count<const HASH_SIZE: usize>(paths: &[[u8; HASH_SIZE]]) -> usize {
    let mut prefixes = std::collections::HashSet::new();
    for (i, a) in paths.iter().enumerate() {
        for b in paths.iter().skip(i + 1) {
            for depth in 0..=common_prefix_len(a, b).min(HASH_SIZE * 8 - 1) {
                let prefix: Vec<bool> = (0..depth).map(|d| bit_at(a, d)).collect();
                prefixes.insert(prefix);
            }
        }
    }
    prefixes.len()
}

/// Counts `(leaves, inner nodes)` reachable from the tree root.
pub(crate) fn count_nodes<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError>(
    tree: &SparseMerkleTree<HASH_SIZE, H, DbError>,
) -> (usize, usize) {
    let mut iter = tree.iter();
    let (mut leaves, mut inner) = (0, 0);
    while iter.advance() {
        if iter.is_leaf() {
            leaves += 1;
        } else {
            inner += 1;
        }
    }
    assert!(iter.is_exhausted());
    (leaves, inner)
}
