//! Chunked byte storage.
//!
//! An unbounded logical byte range is split into chunks of bounded capacity:
//! - [`Chunk`]: capacity-clamped view over a leaf byte store;
//! - [`ChunkFactory`]: where chunk bytes physically live (heap or one file
//!   per chunk);
//! - [`ChunkManager`]: ordered chunk descriptors, position lookup and
//!   structural edits, addressed through versioned [`Locator`]s;
//! - [`ChunkedByteStore`]: the full `ByteStore` contract on top of a manager.

pub mod chunk;
pub mod factory;
pub mod manager;
pub mod store;

pub use chunk::Chunk;
pub use factory::{ChunkFactory, DirectoryChunkFactory, MemoryChunkFactory};
pub use manager::{ChunkDescriptor, ChunkManager, ChunkStats, Locator, SPLIT_COPY_STEP};
pub use store::ChunkedByteStore;
