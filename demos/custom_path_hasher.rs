//! Example of replacing the key to path derivation
//!
//! Keys here are already fixed width identifiers, so they are used as paths directly
//! instead of being hashed.

use std::{convert::Infallible, sync::Arc};

use kvsmt::{set_path_hasher, MemoryStore, SparseMerkleTree};
use sha2::Sha256;

/// Pads or truncates the key to 32 bytes.
fn identity_path(key: &[u8]) -> [u8; 32] {
    let mut path = [0u8; 32];
    let len = key.len().min(32);
    path[..len].copy_from_slice(&key[..len]);
    path
}

fn main() {
    let nodes = Arc::new(MemoryStore::new());
    let values = Arc::new(MemoryStore::new());
    let mut tree = SparseMerkleTree::<32, Sha256, Infallible>::with_options(
        nodes.clone(),
        values.clone(),
        [set_path_hasher(identity_path)],
    );

    tree.update(&[0x00; 32], b"low").unwrap();
    tree.update(&[0xff; 32], b"high").unwrap();
    tree.update(&[0x80; 32], b"middle").unwrap();

    // With identity paths leaves come out in key order
    let mut iter = tree.iter();
    while iter.advance() {
        if let Some(path) = iter.leaf_key() {
            let value = iter.leaf_value().unwrap().unwrap_or_default();
            println!("{} -> {}", hex::encode(path), String::from_utf8_lossy(&value));
        }
    }
    println!("Root hash: {}", hex::encode(tree.root()));

    // Reopening the root needs the same path hasher
    let reopened = SparseMerkleTree::<32, Sha256, Infallible>::import(
        nodes,
        values,
        tree.root(),
        [set_path_hasher(identity_path)],
    );
    println!(
        "middle -> {}",
        String::from_utf8_lossy(&reopened.get(&[0x80; 32]).unwrap())
    );
}
