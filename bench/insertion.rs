use std::{convert::Infallible, sync::Arc};

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use kvsmt::{MemoryStore, SparseMerkleTree};
use sha2::Sha256;

type Tree = SparseMerkleTree<32, Sha256, Infallible>;

pub fn generate_random_pairs(count: usize) -> Vec<([u8; 32], Vec<u8>)> {
    (0..count)
        .map(|_| {
            let value = (0..32).map(|_| rand::random::<u8>()).collect();
            (rand::random(), value)
        })
        .collect()
}

fn new_tree() -> Tree {
    Tree::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
}

fn bench_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("SMT Insertion");

    group.bench_function("Insert 100 keys", |b| {
        b.iter_batched(
            || generate_random_pairs(100),
            |pairs| {
                let mut tree = new_tree();
                for (key, value) in pairs.iter() {
                    tree.update(key, value).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("Delete 100 keys", |b| {
        b.iter_batched(
            || {
                let pairs = generate_random_pairs(100);
                let mut tree = new_tree();
                for (key, value) in pairs.iter() {
                    tree.update(key, value).unwrap();
                }
                (tree, pairs)
            },
            |(mut tree, pairs)| {
                for (key, _) in pairs.iter() {
                    tree.delete(key).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_insertion);
criterion_main!(benches);
