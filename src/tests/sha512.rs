use std::{convert::Infallible, sync::Arc};

use hex_literal::hex;
use sha2::{Digest, Sha512};

use super::{count_nodes, shared_prefix_count, NINE_KEYS};
use crate::{node::Hasher, CompressedProof, MemoryStore, SparseMerkleTree};

impl Hasher<64> for Sha512 {
    fn hash(data: &[u8]) -> [u8; 64] {
        let mut hasher = Sha512::new();
        hasher.update(data);
        hasher.finalize().into()
    }
}

type Tree = SparseMerkleTree<64, Sha512, Infallible>;

fn new_tree() -> Tree {
    Tree::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
}

#[test]
fn test_empty_tree() {
    let tree = new_tree();
    assert_eq!(tree.root(), [0; 64]);
    assert_eq!(Tree::max_depth(), 512);
    assert!(tree.get(b"foo").unwrap_err().is_not_found());
}

#[test]
fn test_single_leaf() {
    let mut tree = new_tree();
    tree.update(b"foo", b"bar").unwrap();
    assert_eq!(
        tree.root(),
        hex!("04f8c75c0e1c5dd151bd638e45b0177b313e3eb370156d88b0c6c4cb4403fc9c38f7021796e2e39ce359e9d28996b1f9be8848f6b6b534e12cf678e42416ba0b")
    );
}

#[test]
fn test_nine_keys() {
    let mut tree = new_tree();
    for (key, value) in NINE_KEYS {
        tree.update(key.as_bytes(), value.as_bytes()).unwrap();
    }
    assert_eq!(
        tree.root(),
        hex!("19f4c7553b4579640ce206a3f8325195b59d36f1cf134195258607b82400adf944108edf45b441e3da44f727a79592a05b7bd7486b909b1481fc53f6e0ae8e78")
    );
    let paths: Vec<_> = NINE_KEYS
        .iter()
        .map(|(key, _)| tree.path(key.as_bytes()))
        .collect();
    let (leaves, inner) = count_nodes(&tree);
    assert_eq!(leaves, 9);
    assert_eq!(inner, shared_prefix_count(&paths));
    assert_eq!(inner, 14);

    let root = tree.root();
    for (key, value) in NINE_KEYS {
        let proof = tree.prove(key.as_bytes()).unwrap();
        assert!(tree.verify_proof(&proof, &root, key.as_bytes(), Some(value.as_bytes())));
        let compressed = CompressedProof::<64>::decode(&proof.compress().encode().unwrap()).unwrap();
        assert_eq!(compressed.decompress().unwrap(), proof);
    }

    for (key, _) in NINE_KEYS.iter().rev() {
        tree.delete(key.as_bytes()).unwrap();
    }
    assert!(tree.is_empty());
}
