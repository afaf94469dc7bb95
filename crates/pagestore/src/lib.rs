//! Chunked, page-buffered storage for large sequential collections.
//!
//! The layers compose bottom-up:
//!
//! 1. a leaf [`ByteStore`] ([`MemoryByteStore`], [`FileByteStore`]);
//! 2. optionally a [`ChunkedByteStore`], splitting an unbounded byte range
//!    into bounded chunks through a [`ChunkManager`];
//! 3. an [`AlignedByteStore`] / [`SerializedStore`] giving element-indexed,
//!    typed access;
//! 4. a [`BufferedStore`] paging window in front of any [`ElementStore`].
//!
//! ```
//! use pagestore::{BufferConfig, BufferedStore, ChunkedByteStore, SerializedStore, U64Marshal};
//!
//! let bytes = ChunkedByteStore::with_memory_chunks(4096)?;
//! let elements = SerializedStore::new(bytes, U64Marshal)?;
//! let mut list = BufferedStore::new(elements, BufferConfig::default())?;
//! for i in 0..10_000_u64 {
//!     list.push(i * 3)?;
//! }
//! assert_eq!(list.get(1234)?, 3702);
//! # Ok::<(), pagestore::StoreError>(())
//! ```

pub use pagestore_buffer::{Buffer, BufferStats, BufferedStore};
pub use pagestore_chunk::{
    Chunk, ChunkDescriptor, ChunkFactory, ChunkManager, ChunkStats, ChunkedByteStore,
    DirectoryChunkFactory, Locator, MemoryChunkFactory, SPLIT_COPY_STEP,
};
pub use pagestore_element::{AlignedByteStore, SerializedStore, VecStore};
pub use pagestore_error::{Result, StoreError};
pub use pagestore_types::{
    BufferConfig, ByteStore, ChunkConfig, ChunkId, DEFAULT_BUFFER_MAX_SIZE, DEFAULT_BUFFER_SIZE,
    DEFAULT_CHUNK_MAX_CAPACITY, ElementStore, F64Marshal, FixedBytesMarshal, I32Marshal,
    I64Marshal, Marshal, U16Marshal, U32Marshal, U64Marshal,
};
pub use pagestore_vfs::{FileByteStore, MemoryByteStore};
