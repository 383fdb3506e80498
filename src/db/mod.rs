mod memory;
mod store;

pub use memory::MemoryStore;
pub use store::{SharedStore, Store, ThreadSafe};
