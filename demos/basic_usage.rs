//! Basic example of using the sparse Merkle tree
//!
//! This example demonstrates:
//! - Creating a new tree over in-memory stores
//! - Updating and reading keys
//! - Building and verifying inclusion and exclusion proofs
//! - Reading an older root after further updates

use std::{convert::Infallible, sync::Arc};

use kvsmt::{CompressedProof, MemoryStore, SparseMerkleTree};
use sha2::Sha256;

fn main() {
    // Create a new tree with 32-byte hashes using SHA256
    let nodes = Arc::new(MemoryStore::new());
    let values = Arc::new(MemoryStore::new());
    let mut tree = SparseMerkleTree::<32, Sha256, Infallible>::new(nodes.clone(), values.clone());

    tree.update(b"alice", b"100").unwrap();
    tree.update(b"bob", b"200").unwrap();
    let snapshot = tree.update(b"carol", b"300").unwrap();
    println!("Root hash: {}", hex::encode(snapshot));

    println!("bob -> {}", String::from_utf8_lossy(&tree.get(b"bob").unwrap()));

    // Inclusion proof for alice, shipped in its compressed form
    let proof = tree.prove(b"alice").unwrap();
    let encoded = proof.compress().encode().unwrap();
    println!("Proof: {} siblings, {} bytes encoded", proof.depth(), encoded.len());
    let received = CompressedProof::<32>::decode(&encoded)
        .unwrap()
        .decompress()
        .unwrap();
    println!(
        "alice = 100: {}",
        tree.verify_proof(&received, &snapshot, b"alice", Some(b"100"))
    );

    // Exclusion proof for a key that was never inserted
    let proof = tree.prove(b"mallory").unwrap();
    println!(
        "mallory absent: {}",
        tree.verify_proof(&proof, &snapshot, b"mallory", None)
    );

    // Older roots stay readable
    tree.update(b"alice", b"150").unwrap();
    tree.delete(b"bob").unwrap();
    let old = SparseMerkleTree::<32, Sha256, Infallible>::import(nodes, values, snapshot, []);
    println!(
        "alice now {}, at snapshot {}",
        String::from_utf8_lossy(&tree.get(b"alice").unwrap()),
        String::from_utf8_lossy(&old.get(b"alice").unwrap())
    );

    for leaf in tree.leaves() {
        let (path, value) = leaf.unwrap();
        println!("{} -> {}", hex::encode(path), String::from_utf8_lossy(&value));
    }
}
