//! Scenario tests for the SHA-256 tree

use std::{convert::Infallible, sync::Arc};

use hex_literal::hex;
use rand::{seq::SliceRandom, thread_rng};
use sha2::Sha256;

use super::{count_nodes, shared_prefix_count, NINE_KEYS};
use crate::{MemoryStore, SparseMerkleTree, TreeError};

type Tree = SparseMerkleTree<32, Sha256, Infallible>;

fn new_tree() -> Tree {
    Tree::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
}

fn nine_key_tree() -> Tree {
    let mut tree = new_tree();
    for (key, value) in NINE_KEYS {
        tree.update(key.as_bytes(), value.as_bytes()).unwrap();
    }
    tree
}

#[test]
fn test_empty_tree() {
    let mut tree = new_tree();
    assert_eq!(tree.root(), [0; 32]);
    assert!(matches!(
        tree.get(b"foo"),
        Err(TreeError::KeyNotFound { .. })
    ));
    assert!(matches!(
        tree.delete(b"foo"),
        Err(TreeError::KeyNotFound { .. })
    ));
    assert_eq!(count_nodes(&tree), (0, 0));
    let proof = tree.prove(b"foo").unwrap();
    assert!(tree.verify_proof(&proof, &tree.root(), b"foo", None));
}

#[test]
fn test_single_leaf_root() {
    let mut tree = new_tree();
    tree.update(b"foo", b"bar").unwrap();
    assert_eq!(
        tree.root(),
        hex!("ace64ee83ecf596655deac72c646a30ae7bd71635992cd4c1a5a10350fcc1c52")
    );
    tree.update(b"baz", b"qux").unwrap();
    assert_eq!(
        tree.root(),
        hex!("8ea490837aa7e727a52d04e8a76974e6a26bde6410ee9383d2cad725783e9f6d")
    );
}

#[test]
fn test_nine_keys() {
    let tree = nine_key_tree();
    assert_eq!(
        tree.root(),
        hex!("f857a632df49f81b2c2cafd8683cf6bf80fd0cf3351f6bac8a04e24b341c4369")
    );
    for (key, value) in NINE_KEYS {
        assert_eq!(tree.get(key.as_bytes()).unwrap(), value.as_bytes());
    }
    let paths: Vec<_> = NINE_KEYS
        .iter()
        .map(|(key, _)| tree.path(key.as_bytes()))
        .collect();
    let (leaves, inner) = count_nodes(&tree);
    assert_eq!(leaves, 9);
    assert_eq!(inner, shared_prefix_count(&paths));
    assert_eq!(inner, 9);
}

#[test]
fn test_nine_keys_proofs() {
    let tree = nine_key_tree();
    let root = tree.root();
    for (key, value) in NINE_KEYS {
        let proof = tree.prove(key.as_bytes()).unwrap();
        assert!(tree.verify_proof(&proof, &root, key.as_bytes(), Some(value.as_bytes())));
        assert!(!tree.verify_proof(&proof, &root, key.as_bytes(), Some(b"zz")));
        assert!(!tree.verify_proof(&proof, &root, key.as_bytes(), None));
        let decoded = crate::CompressedProof::<32>::decode(&proof.compress().encode().unwrap())
            .unwrap()
            .decompress()
            .unwrap();
        assert_eq!(decoded, proof);
    }
    for key in ["", "aardvar", "barbs", "fo", "jarsjars"] {
        let proof = tree.prove(key.as_bytes()).unwrap();
        assert!(tree.verify_proof(&proof, &root, key.as_bytes(), None));
        assert!(!tree.verify_proof(&proof, &root, key.as_bytes(), Some(b"a")));
    }
}

#[test]
fn test_history_independent() {
    let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..64u32)
        .map(|i| (i.to_be_bytes().to_vec(), (i * 7).to_le_bytes().to_vec()))
        .collect();
    let mut reference = new_tree();
    for (key, value) in pairs.iter() {
        reference.update(key, value).unwrap();
    }
    let mut rng = thread_rng();
    for _ in 0..5 {
        let mut shuffled = pairs.clone();
        shuffled.shuffle(&mut rng);
        let mut tree = new_tree();
        for (key, value) in shuffled.iter() {
            tree.update(key, value).unwrap();
        }
        assert_eq!(tree.root(), reference.root());
    }
}

#[test]
fn test_delete_is_inverse() {
    let mut keys: Vec<u32> = (0..48).collect();
    keys.shuffle(&mut thread_rng());
    let (kept, removed) = keys.split_at(32);

    let mut expected = new_tree();
    for key in kept {
        expected.update(&key.to_be_bytes(), &key.to_le_bytes()).unwrap();
    }

    let mut tree = new_tree();
    for key in keys.iter() {
        tree.update(&key.to_be_bytes(), &key.to_le_bytes()).unwrap();
    }
    for key in removed {
        tree.delete(&key.to_be_bytes()).unwrap();
    }
    assert_eq!(tree.root(), expected.root());
    for key in kept {
        assert!(tree.has(&key.to_be_bytes()).unwrap());
    }
    for key in removed {
        assert!(!tree.has(&key.to_be_bytes()).unwrap());
    }

    for key in kept {
        tree.delete(&key.to_be_bytes()).unwrap();
    }
    assert!(tree.is_empty());
}

#[test]
fn test_update_overwrite_order() {
    let mut tree = nine_key_tree();
    let root = tree.root();
    tree.update(b"foo", b"changed").unwrap();
    assert_ne!(tree.root(), root);
    tree.update(b"foo", b"a").unwrap();
    assert_eq!(tree.root(), root);
}

#[test]
fn test_structural_sharing() {
    let nodes = Arc::new(MemoryStore::new());
    let values = Arc::new(MemoryStore::new());
    let mut tree = Tree::new(nodes.clone(), values.clone());
    for (key, value) in NINE_KEYS {
        tree.update(key.as_bytes(), value.as_bytes()).unwrap();
    }
    let old_root = tree.root();
    let before = nodes.len();
    tree.update(b"foo", b"new").unwrap();
    // only the changed path is written, never more than one node per level
    assert!(nodes.len() - before <= 33);
    tree.delete(b"jars").unwrap();

    let old = Tree::import(nodes, values, old_root, []);
    for (key, value) in NINE_KEYS {
        assert_eq!(old.get(key.as_bytes()).unwrap(), value.as_bytes());
    }
    assert_eq!(tree.get(b"foo").unwrap(), b"new");
    assert!(!tree.has(b"jars").unwrap());
}

// sharing a tree across threads needs the `multi-thread` store bounds
#[cfg(feature = "multi-thread")]
#[test]
fn test_parallel_readers() {
    let tree = nine_key_tree();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for (key, value) in NINE_KEYS {
                    assert_eq!(tree.get(key.as_bytes()).unwrap(), value.as_bytes());
                    let proof = tree.prove(key.as_bytes()).unwrap();
                    assert!(tree.verify_proof(
                        &proof,
                        &tree.root(),
                        key.as_bytes(),
                        Some(value.as_bytes())
                    ));
                }
            });
        }
    });
}

#[test]
fn test_leaves_export() {
    let tree = nine_key_tree();
    let mut exported = new_tree();
    let mut count = 0;
    for leaf in tree.leaves() {
        let (path, value) = leaf.unwrap();
        let original = NINE_KEYS
            .iter()
            .find(|(key, _)| tree.path(key.as_bytes()) == path)
            .unwrap();
        assert_eq!(original.1.as_bytes(), value.as_slice());
        exported.update(original.0.as_bytes(), &value).unwrap();
        count += 1;
    }
    assert_eq!(count, 9);
    assert_eq!(exported.root(), tree.root());
}
