//! `ByteStore` over a chunk sequence.

use pagestore_error::{Result, StoreError};
use pagestore_types::{ByteStore, ChunkConfig, check_position, check_span};
use tracing::{debug, trace};

use crate::factory::{ChunkFactory, MemoryChunkFactory};
use crate::manager::{ChunkManager, ChunkStats, Locator};

/// An unbounded logical byte range stored as bounded chunks.
///
/// Equal-length replacements overwrite chunk bytes in place. Growth splits the
/// chunk at the insertion point only when its spare capacity cannot absorb the
/// new bytes; shrinking drops fully covered chunks and trims the partial ones
/// at either edge. No step allocates more than one chunk's worth of bytes.
#[derive(Debug)]
pub struct ChunkedByteStore<F: ChunkFactory> {
    manager: ChunkManager<F>,
}

impl ChunkedByteStore<MemoryChunkFactory> {
    /// Heap-backed store with the given chunk capacity.
    pub fn with_memory_chunks(chunk_max_capacity: u64) -> Result<Self> {
        Self::new(MemoryChunkFactory, ChunkConfig::new(chunk_max_capacity)?)
    }
}

impl<F: ChunkFactory> ChunkedByteStore<F> {
    pub fn new(factory: F, config: ChunkConfig) -> Result<Self> {
        Ok(Self {
            manager: ChunkManager::new(factory, config)?,
        })
    }

    #[must_use]
    pub const fn manager(&self) -> &ChunkManager<F> {
        &self.manager
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.manager.chunk_count()
    }

    #[must_use]
    pub const fn stats(&self) -> ChunkStats {
        self.manager.stats()
    }

    /// Drop all bytes and chunks.
    pub fn clear(&mut self) -> Result<()> {
        self.manager.clear()
    }

    /// Merge neighbouring chunks wherever the second fits into the first's
    /// spare capacity. Returns the number of merges performed.
    pub fn compact(&mut self) -> Result<usize> {
        let mut merges = 0;
        let mut cursor = self.manager.first_chunk();
        while let Some(mut loc) = cursor {
            if self.manager.merge_next_chunk(&mut loc)? {
                merges += 1;
                cursor = Some(loc);
            } else {
                cursor = self.manager.find_next_chunk(&loc)?;
            }
        }
        debug!(merges, chunks = self.manager.chunk_count(), "chunked store compacted");
        Ok(merges)
    }

    /// Bytes a write starting at chunk-relative `rel` may put into the located
    /// chunk: up to capacity for the last chunk, otherwise only over existing
    /// bytes so that later chunks never shift.
    fn write_room(&self, loc: &Locator, rel: u64) -> Result<u64> {
        let desc = self.manager.descriptor(loc)?;
        let limit = if self.manager.is_last_chunk(loc)? {
            desc.capacity()
        } else {
            desc.size()
        };
        Ok(limit.saturating_sub(rel))
    }

    /// Open a gap of `data.len()` bytes at `at` and fill it.
    fn insert_bytes(&mut self, at: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if at == self.manager.size() {
            self.write(at, data)?;
            return Ok(());
        }

        let mut loc = self.manager.get_chunk_by_position(at)?;
        let desc = self.manager.descriptor(&loc)?;
        let rel = at - loc.offset();
        let len = data.len() as u64;
        if desc.spare() >= len {
            self.manager.replace_chunk_range(&mut loc, rel, rel, data)?;
            return Ok(());
        }

        // Make `at` a chunk boundary, then fill forward from the chunk ending
        // there, inserting fresh chunks for whatever does not fit.
        let mut cursor = if rel == 0 {
            self.manager.insert_prior_chunk(&loc, len)?
        } else {
            self.manager.split_chunk(&loc, at)?
        };
        let mut done = 0;
        loop {
            let desc = self.manager.descriptor(&cursor)?;
            let n = desc.spare().min((data.len() - done) as u64) as usize;
            if n > 0 {
                let written =
                    self.manager
                        .write_chunk(&mut cursor, desc.size(), &data[done..done + n])?;
                if written != n {
                    return Err(StoreError::internal(format_args!(
                        "chunk took {written} of {n} inserted bytes"
                    )));
                }
                done += n;
            }
            if done == data.len() {
                return Ok(());
            }
            cursor = self
                .manager
                .insert_next_chunk(&cursor, (data.len() - done) as u64)?;
        }
    }

    /// Remove `len` bytes starting at `from`.
    fn remove_bytes(&mut self, from: u64, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let mut cursor = self.manager.get_chunk_by_position(from)?;
        let mut rel = from - cursor.offset();
        let mut remaining = len;
        while remaining > 0 {
            let size = self.manager.descriptor(&cursor)?.size();
            let take = (size - rel).min(remaining);
            remaining -= take;
            if rel == 0 && take == size {
                match self.manager.remove_chunk(&cursor)? {
                    Some(next) => cursor = next,
                    None => break,
                }
                continue;
            }
            self.manager
                .replace_chunk_range(&mut cursor, rel, rel + take, &[])?;
            if remaining == 0 {
                break;
            }
            cursor = self.manager.find_next_chunk(&cursor)?.ok_or_else(|| {
                StoreError::internal("removal ran past the last chunk")
            })?;
            rel = 0;
        }
        if remaining != 0 {
            return Err(StoreError::internal(format_args!(
                "{remaining} bytes left to remove after the last chunk"
            )));
        }
        Ok(())
    }
}

impl<F: ChunkFactory> ByteStore for ChunkedByteStore<F> {
    fn size(&self) -> u64 {
        self.manager.size()
    }

    fn read(&mut self, from: u64, buf: &mut [u8]) -> Result<usize> {
        check_position(from, self.manager.size())?;
        let Some(mut loc) = self.manager.find_chunk_by_position(from) else {
            return Ok(0);
        };
        let mut rel = from - loc.offset();
        let mut done = 0;
        while done < buf.len() {
            done += self.manager.read_chunk(&loc, rel, &mut buf[done..])?;
            match self.manager.find_next_chunk(&loc)? {
                Some(next) => {
                    loc = next;
                    rel = 0;
                }
                None => break,
            }
        }
        Ok(done)
    }

    fn write(&mut self, from: u64, buf: &[u8]) -> Result<usize> {
        check_position(from, self.manager.size())?;
        if buf.is_empty() {
            return Ok(0);
        }
        trace!(from, len = buf.len(), "chunked write");
        let mut loc = self.manager.get_or_create_chunk_by_position(from)?;
        let mut rel = from - loc.offset();
        let mut done = 0;
        loop {
            let n = self
                .write_room(&loc, rel)?
                .min((buf.len() - done) as u64) as usize;
            if n > 0 {
                let written = self
                    .manager
                    .write_chunk(&mut loc, rel, &buf[done..done + n])?;
                if written != n {
                    return Err(StoreError::internal(format_args!(
                        "chunk took {written} of {n} written bytes"
                    )));
                }
                done += n;
            }
            if done == buf.len() {
                return Ok(done);
            }
            loc = self.manager.get_or_create_next_chunk(&loc)?;
            rel = 0;
        }
    }

    fn replace_range(&mut self, from: u64, to: u64, buf: &[u8]) -> Result<usize> {
        let size = self.manager.size();
        check_span(from, to, size)?;
        let removed = to - from;
        let inserted = buf.len() as u64;
        trace!(from, to, inserted, "chunked replace");

        if from == 0 && to == size {
            self.manager.clear()?;
            return self.write(0, buf);
        }
        if inserted == removed || (to == size && inserted > removed) {
            return self.write(from, buf);
        }
        if inserted > removed {
            let (head, rest) = buf.split_at(removed as usize);
            self.write(from, head)?;
            self.insert_bytes(to, rest)?;
        } else {
            self.write(from, buf)?;
            self.remove_bytes(from + inserted, removed - inserted)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.manager.release_chunks().map(|_| ())
    }
}
