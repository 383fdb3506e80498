//! Store failures are propagated and never move the root

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use sha2::Sha256;
use thiserror::Error;

use super::NINE_KEYS;
use crate::{MemoryStore, SparseMerkleTree, Store, TreeError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("injected {op} failure")]
struct Fault {
    op: &'static str,
}

/// Memory store that fails puts once its budget is spent, and every get when asked to.
#[derive(Default)]
struct FaultyStore {
    inner: MemoryStore,
    put_budget: AtomicUsize,
    fail_gets: AtomicBool,
}

impl FaultyStore {
    fn new() -> Self {
        Self {
            put_budget: AtomicUsize::new(usize::MAX),
            ..Default::default()
        }
    }

    fn allow_puts(&self, count: usize) {
        self.put_budget.store(count, Ordering::SeqCst);
    }

    fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }
}

impl Store for FaultyStore {
    type Error = Fault;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(Fault { op: "get" });
        }
        Ok(self.inner.get(key).unwrap_or_else(|never| match never {}))
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), Self::Error> {
        let spent = self
            .put_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        if spent.is_err() {
            return Err(Fault { op: "put" });
        }
        self.inner
            .put(key, value)
            .unwrap_or_else(|never| match never {});
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), Self::Error> {
        self.inner.delete(key).unwrap_or_else(|never| match never {});
        Ok(())
    }
}

type Tree = SparseMerkleTree<32, Sha256, Fault>;

fn new_tree() -> (Arc<FaultyStore>, Tree) {
    let nodes = Arc::new(FaultyStore::new());
    let tree = Tree::new(nodes.clone(), Arc::new(FaultyStore::new()));
    (nodes, tree)
}

#[test]
fn test_failed_update_keeps_root() {
    let (nodes, mut tree) = new_tree();
    for (key, value) in NINE_KEYS {
        tree.update(key.as_bytes(), value.as_bytes()).unwrap();
    }
    let root = tree.root();

    for budget in 0..2 {
        nodes.allow_puts(budget);
        assert_eq!(
            tree.update(b"foo", b"changed"),
            Err(TreeError::Store(Fault { op: "put" }))
        );
        assert_eq!(tree.root(), root);
        assert_eq!(tree.get(b"foo").unwrap(), b"a");
    }

    nodes.allow_puts(usize::MAX);
    tree.update(b"foo", b"changed").unwrap();
    assert_eq!(tree.get(b"foo").unwrap(), b"changed");
}

#[test]
fn test_failed_delete_keeps_root() {
    let (nodes, mut tree) = new_tree();
    for (key, value) in NINE_KEYS {
        tree.update(key.as_bytes(), value.as_bytes()).unwrap();
    }
    let root = tree.root();
    nodes.allow_puts(0);
    assert!(matches!(tree.delete(b"bar"), Err(TreeError::Store(_))));
    assert_eq!(tree.root(), root);
    assert!(tree.has(b"bar").unwrap());
}

#[test]
fn test_failed_read() {
    let (nodes, mut tree) = new_tree();
    tree.update(b"foo", b"bar").unwrap();
    nodes.fail_gets(true);
    let err = tree.get(b"foo").unwrap_err();
    assert_eq!(err, TreeError::Store(Fault { op: "get" }));
    assert_eq!(format!("{}", err), "store failure: injected get failure");
    assert!(tree.prove(b"foo").is_err());
    let mut iter = tree.iter();
    assert!(!iter.advance());
    assert!(!iter.is_exhausted());
    nodes.fail_gets(false);
    assert_eq!(tree.get(b"foo").unwrap(), b"bar");
}
