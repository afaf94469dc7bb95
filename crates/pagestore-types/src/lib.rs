//! Shared contracts for the pagestore workspace.
//!
//! - [`ByteStore`]: random-access byte range store (leaf stores, chunks,
//!   chunked stores).
//! - [`ElementStore`]: index-addressed store of fixed-shape elements (the
//!   "main" store of the paging layer).
//! - [`Marshal`]: fixed-size binary encoding of typed elements.
//! - [`ChunkConfig`] / [`BufferConfig`]: eagerly validated tunables.

pub mod byte_store;
pub mod config;
pub mod element_store;
pub mod marshal;

pub use byte_store::{ByteStore, check_position, check_span};
pub use config::{
    BufferConfig, ChunkConfig, DEFAULT_BUFFER_MAX_SIZE, DEFAULT_BUFFER_SIZE,
    DEFAULT_CHUNK_MAX_CAPACITY,
};
pub use element_store::{ElementStore, check_element_span, check_index};
pub use marshal::{
    F64Marshal, FixedBytesMarshal, I32Marshal, I64Marshal, Marshal, U16Marshal, U32Marshal,
    U64Marshal, encode_checked,
};

use std::fmt;

/// Stable identity of a chunk, never reused within one chunk manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(u64);

impl ChunkId {
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk#{}", self.0)
    }
}
