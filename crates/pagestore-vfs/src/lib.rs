//! Leaf [`ByteStore`](pagestore_types::ByteStore) implementations.
//!
//! These are the physical stores chunks and aligned views sit on:
//! - [`MemoryByteStore`]: a growable heap buffer.
//! - [`FileByteStore`]: a host file whose bytes are exactly the logical byte
//!   stream, opened on first use and released by `flush()`/`close()`.

pub mod file;
pub mod memory;

pub use file::FileByteStore;
pub use memory::MemoryByteStore;

/// Largest single copy step used when shifting bytes inside a store.
pub const COPY_STEP: usize = 64 * 1024;
