//! Storage capability consumed by the tree.

use std::sync::Arc;

/// Thread safety marker trait
#[cfg(feature = "multi-thread")]
pub trait ThreadSafe: Send + Sync {}
#[cfg(feature = "multi-thread")]
impl<T: Send + Sync> ThreadSafe for T {}

#[cfg(not(feature = "multi-thread"))]
pub trait ThreadSafe {}
#[cfg(not(feature = "multi-thread"))]
impl<T> ThreadSafe for T {}

/// Byte keyed store backing the tree.
///
/// The tree uses two of them: the node store, keyed by node digest, and the value
/// store, keyed by value hash. Methods take `&self` so a store can be shared between
/// tree handles branching off the same roots; implementations synchronise internally.
///
/// A `put` must be visible to subsequent `get`s once it returns: the tree publishes a
/// parent reference only after its children have been put.
pub trait Store: ThreadSafe {
    /// The error type for store operations
    type Error;

    /// Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error>;

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), Self::Error>;

    /// Deleting an absent key is not an error.
    fn delete(&self, key: &[u8]) -> Result<(), Self::Error>;
}

/// Shared handle to a store, as held by the tree.
pub type SharedStore<DbError> = Arc<dyn Store<Error = DbError>>;
