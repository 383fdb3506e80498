//! Construction time configuration of a tree.

use std::{marker::PhantomData, sync::Arc};

use crate::{
    db::SharedStore,
    node::{zero_value, Hasher},
    path::{DefaultPathHasher, PathHasher},
};

use super::SparseMerkleTree;

/// Pluggable strategies of a tree.
#[derive(Clone)]
pub struct TreeConfig<const HASH_SIZE: usize> {
    path_hasher: Arc<dyn PathHasher<HASH_SIZE>>,
}

impl<const HASH_SIZE: usize> TreeConfig<HASH_SIZE> {
    /// Default configuration: paths are derived with the tree hash function `H`.
    pub fn new<H: Hasher<HASH_SIZE> + 'static>() -> Self {
        Self {
            path_hasher: Arc::new(DefaultPathHasher::<H>::new()),
        }
    }

    pub fn path_hasher(&self) -> &dyn PathHasher<HASH_SIZE> {
        self.path_hasher.as_ref()
    }

    pub fn set_path_hasher(&mut self, path_hasher: Arc<dyn PathHasher<HASH_SIZE>>) {
        self.path_hasher = path_hasher;
    }

    /// Applies the options in order.
    pub fn apply(mut self, options: impl IntoIterator<Item = TreeOption<HASH_SIZE>>) -> Self {
        for option in options {
            option(&mut self);
        }
        self
    }
}

/// An option transforms the configuration before the tree is first used.
pub type TreeOption<const HASH_SIZE: usize> = Box<dyn FnOnce(&mut TreeConfig<HASH_SIZE>)>;

/// Replaces the default path derivation.
pub fn set_path_hasher<const HASH_SIZE: usize, P>(path_hasher: P) -> TreeOption<HASH_SIZE>
where
    P: PathHasher<HASH_SIZE> + 'static,
{
    let path_hasher: Arc<dyn PathHasher<HASH_SIZE>> = Arc::new(path_hasher);
    Box::new(move |config: &mut TreeConfig<HASH_SIZE>| {
        config.set_path_hasher(path_hasher)
    })
}

/// Builder for [`SparseMerkleTree`].
pub struct TreeBuilder<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>, DbError> {
    nodes: SharedStore<DbError>,
    values: SharedStore<DbError>,
    options: Vec<TreeOption<HASH_SIZE>>,
    root: [u8; HASH_SIZE],
    _phantom: PhantomData<fn() -> H>,
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE> + 'static, DbError>
    TreeBuilder<HASH_SIZE, H, DbError>
{
    pub fn new(nodes: SharedStore<DbError>, values: SharedStore<DbError>) -> Self {
        Self {
            nodes,
            values,
            options: Vec::new(),
            root: zero_value(),
            _phantom: PhantomData,
        }
    }

    pub fn option(mut self, option: TreeOption<HASH_SIZE>) -> Self {
        self.options.push(option);
        self
    }

    pub fn path_hasher<P: PathHasher<HASH_SIZE> + 'static>(self, path_hasher: P) -> Self {
        self.option(set_path_hasher(path_hasher))
    }

    /// Opens the tree at an existing root instead of the empty one.
    pub fn root(mut self, root: [u8; HASH_SIZE]) -> Self {
        self.root = root;
        self
    }

    pub fn build(self) -> SparseMerkleTree<HASH_SIZE, H, DbError> {
        let config = TreeConfig::new::<H>().apply(self.options);
        SparseMerkleTree::from_parts(self.nodes, self.values, config, self.root)
    }
}
