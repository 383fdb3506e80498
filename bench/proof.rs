use std::{convert::Infallible, sync::Arc};

use criterion::{criterion_group, criterion_main, Criterion};
use kvsmt::{CompressedProof, MemoryStore, SparseMerkleTree};
use sha2::Sha256;

type Tree = SparseMerkleTree<32, Sha256, Infallible>;

fn populated_tree(count: u32) -> Tree {
    let mut tree = Tree::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
    for i in 0..count {
        tree.update(&i.to_be_bytes(), &i.to_le_bytes()).unwrap();
    }
    tree
}

fn bench_proof(c: &mut Criterion) {
    let mut group = c.benchmark_group("SMT Proofs");
    let tree = populated_tree(1_000);
    let root = tree.root();
    let key = 500u32.to_be_bytes();
    let value = 500u32.to_le_bytes();

    group.bench_function("Prove", |b| b.iter(|| tree.prove(&key).unwrap()));

    let proof = tree.prove(&key).unwrap();
    group.bench_function("Verify", |b| {
        b.iter(|| assert!(tree.verify_proof(&proof, &root, &key, Some(&value))))
    });

    let encoded = proof.compress().encode().unwrap();
    group.bench_function("Compress and encode", |b| {
        b.iter(|| proof.compress().encode().unwrap())
    });
    group.bench_function("Decode and decompress", |b| {
        b.iter(|| {
            CompressedProof::<32>::decode(&encoded)
                .unwrap()
                .decompress()
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_proof);
criterion_main!(benches);
