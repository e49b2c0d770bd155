//! In-memory backends for tests and single-process setups

mod blob;
mod store;

pub use blob::MemoryBlobStorage;
pub use store::{MemoryStore, StoreOp};
