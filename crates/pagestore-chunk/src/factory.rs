//! Physical chunk storage strategies.

use std::path::{Path, PathBuf};

use pagestore_error::{Result, StoreError};
use pagestore_types::{ByteStore, ChunkId};
use pagestore_vfs::{FileByteStore, MemoryByteStore};
use tracing::debug;

/// Largest up-front allocation a heap chunk reserves.
const MAX_PREALLOCATION: u64 = 64 * 1024;

/// Supplies the leaf byte store behind each chunk.
///
/// The manager keeps only descriptors resident; chunk stores are created or
/// reopened through the factory on first access.
pub trait ChunkFactory {
    type Store: ByteStore;

    /// Whether a store released by the manager can later be reopened with its
    /// bytes intact.
    const PERSISTENT: bool;

    /// Fresh, empty storage for a new chunk.
    fn create(&mut self, id: ChunkId, capacity: u64) -> Result<Self::Store>;

    /// Reopen storage previously created for `id`.
    fn open(&mut self, id: ChunkId, capacity: u64) -> Result<Self::Store>;

    /// Discard the storage of a removed chunk. `store` is `None` when the chunk
    /// was never materialised or had been released.
    fn destroy(&mut self, id: ChunkId, store: Option<Self::Store>) -> Result<()>;
}

/// Heap chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryChunkFactory;

impl ChunkFactory for MemoryChunkFactory {
    type Store = MemoryByteStore;

    const PERSISTENT: bool = false;

    fn create(&mut self, _id: ChunkId, capacity: u64) -> Result<MemoryByteStore> {
        Ok(MemoryByteStore::with_capacity(
            capacity.min(MAX_PREALLOCATION) as usize,
        ))
    }

    fn open(&mut self, id: ChunkId, _capacity: u64) -> Result<MemoryByteStore> {
        Err(StoreError::internal(format_args!(
            "{id} was released but heap chunks cannot be reopened"
        )))
    }

    fn destroy(&mut self, _id: ChunkId, _store: Option<MemoryByteStore>) -> Result<()> {
        Ok(())
    }
}

/// One host file per chunk inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryChunkFactory {
    dir: PathBuf,
}

impl DirectoryChunkFactory {
    /// Use `dir` (created if missing) for chunk files.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn chunk_path(&self, id: ChunkId) -> PathBuf {
        self.dir.join(format!("{:016x}.chunk", id.get()))
    }
}

impl ChunkFactory for DirectoryChunkFactory {
    type Store = FileByteStore;

    const PERSISTENT: bool = true;

    fn create(&mut self, id: ChunkId, _capacity: u64) -> Result<FileByteStore> {
        let path = self.chunk_path(id);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(chunk = %id, path = %path.display(), "replaced leftover chunk file");
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        FileByteStore::open(path)
    }

    fn open(&mut self, id: ChunkId, _capacity: u64) -> Result<FileByteStore> {
        FileByteStore::open(self.chunk_path(id))
    }

    fn destroy(&mut self, id: ChunkId, store: Option<FileByteStore>) -> Result<()> {
        drop(store);
        match std::fs::remove_file(self.chunk_path(id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
