//! Ordered chunk descriptors addressed through versioned locators.
//!
//! The manager keeps one [`ChunkDescriptor`] per chunk in positional order;
//! the sum of descriptor sizes is the logical size of the managed byte range.
//! Chunk stores are materialised lazily from the descriptor's id through the
//! [`ChunkFactory`].
//!
//! Every structural edit (descriptor added or removed) and every change of a
//! chunk's size bumps the manager version. A [`Locator`] captures
//! `(index, chunk id, chunk start, version)` and is rejected with
//! [`StoreError::StaleLocator`] once the version moves on. Methods that resize
//! a chunk re-stamp the locator they were handed, so the caller's current
//! locator survives its own writes while every other one is invalidated.

use std::fmt;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use pagestore_error::{Result, StoreError};
use pagestore_types::{ByteStore, ChunkConfig, ChunkId, check_position};
use tracing::debug;

use crate::chunk::Chunk;
use crate::factory::ChunkFactory;

/// Largest buffer used to move bytes between chunks during split and merge.
pub const SPLIT_COPY_STEP: usize = 8 * 1024;

const INITIAL_VERSION: u64 = 0;

/// Resident metadata for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    id: ChunkId,
    size: u64,
    capacity: u64,
    materialized: bool,
}

impl ChunkDescriptor {
    const fn new(id: ChunkId, capacity: u64) -> Self {
        Self {
            id,
            size: 0,
            capacity,
            materialized: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> ChunkId {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    #[inline]
    #[must_use]
    pub const fn spare(&self) -> u64 {
        self.capacity.saturating_sub(self.size)
    }

    /// Whether backing storage has ever been created for this chunk.
    #[inline]
    #[must_use]
    pub const fn is_materialized(&self) -> bool {
        self.materialized
    }
}

/// Short-lived handle to one chunk, valid until the manager version changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    index: usize,
    id: ChunkId,
    offset: u64,
    version: u64,
}

impl Locator {
    /// Structural position of the chunk.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> ChunkId {
        self.id
    }

    /// Global byte offset of the chunk's first byte.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Manager version captured when the locator was issued.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }
}

/// Structural edit counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Chunks created (appended or inserted).
    pub created: u64,
    /// Splits that moved data into a new chunk.
    pub splits: u64,
    /// Chunks removed, including those dropped by `clear`.
    pub removed: u64,
    /// Chunks folded into their predecessor.
    pub merged: u64,
}

/// Owns the ordered chunk sequence of one logical byte range.
pub struct ChunkManager<F: ChunkFactory> {
    factory: F,
    descriptors: Vec<ChunkDescriptor>,
    chunks: HashMap<ChunkId, Chunk<F::Store>>,
    chunk_max_capacity: u64,
    version: u64,
    next_id: ChunkId,
    stats: ChunkStats,
}

impl<F: ChunkFactory> fmt::Debug for ChunkManager<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkManager")
            .field("descriptors", &self.descriptors)
            .field("materialized", &self.chunks.len())
            .field("chunk_max_capacity", &self.chunk_max_capacity)
            .field("version", &self.version)
            .field("next_id", &self.next_id)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<F: ChunkFactory> ChunkManager<F> {
    pub fn new(factory: F, config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            factory,
            descriptors: Vec::new(),
            chunks: HashMap::new(),
            chunk_max_capacity: config.chunk_max_capacity(),
            version: INITIAL_VERSION,
            next_id: ChunkId::new(1),
            stats: ChunkStats::default(),
        })
    }

    #[inline]
    #[must_use]
    pub const fn chunk_max_capacity(&self) -> u64 {
        self.chunk_max_capacity
    }

    #[inline]
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Logical size: the sum of all chunk sizes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.descriptors.iter().map(ChunkDescriptor::size).sum()
    }

    #[must_use]
    pub fn descriptors(&self) -> &[ChunkDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn chunk_sizes(&self) -> Vec<u64> {
        self.descriptors.iter().map(ChunkDescriptor::size).collect()
    }

    #[must_use]
    pub const fn stats(&self) -> ChunkStats {
        self.stats
    }

    #[must_use]
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Chunk covering `position`.
    ///
    /// A position on the boundary between two chunks resolves to the later
    /// one; the end of the last chunk (the append position) resolves to the
    /// last chunk. Positions past the logical size, or any position when there
    /// are no chunks, are out of range.
    pub fn get_chunk_by_position(&self, position: u64) -> Result<Locator> {
        check_position(position, self.size())?;
        self.scan(position).ok_or_else(|| {
            StoreError::out_of_range("byte position", format_args!("{position} (no chunks)"))
        })
    }

    /// Like [`Self::get_chunk_by_position`] but reports a position past the
    /// end as `None` instead of an error.
    #[must_use]
    pub fn find_chunk_by_position(&self, position: u64) -> Option<Locator> {
        if position > self.size() {
            return None;
        }
        self.scan(position)
    }

    #[must_use]
    pub fn first_chunk(&self) -> Option<Locator> {
        (!self.descriptors.is_empty()).then(|| self.locator_at(0, 0))
    }

    /// Chunk that should receive a write at `position`, appending a new
    /// max-capacity chunk when nothing can take it.
    ///
    /// Unlike [`Self::get_chunk_by_position`], the last chunk is judged by its
    /// capacity rather than its size, so an append that still fits grows the
    /// last chunk in place.
    pub fn get_or_create_chunk_by_position(&mut self, position: u64) -> Result<Locator> {
        let size = self.size();
        check_position(position, size)?;
        let last = self.descriptors.len().checked_sub(1);
        let mut offset = 0;
        for (index, desc) in self.descriptors.iter().enumerate() {
            let reach = if Some(index) == last {
                desc.capacity
            } else {
                desc.size
            };
            if position < offset + reach {
                return Ok(self.locator_at(index, offset));
            }
            offset += desc.size;
        }
        let index = self.descriptors.len();
        self.insert_descriptor(index, self.chunk_max_capacity);
        Ok(self.locator_at(index, size))
    }

    /// Chunk immediately after the located one, if any.
    pub fn find_next_chunk(&self, locator: &Locator) -> Result<Option<Locator>> {
        let desc = *self.check(locator)?;
        let next = locator.index + 1;
        Ok((next < self.descriptors.len())
            .then(|| self.locator_at(next, locator.offset + desc.size)))
    }

    /// Chunk immediately after the located one, appending one if needed.
    pub fn get_or_create_next_chunk(&mut self, locator: &Locator) -> Result<Locator> {
        if let Some(next) = self.find_next_chunk(locator)? {
            return Ok(next);
        }
        let desc = *self.check(locator)?;
        let index = locator.index + 1;
        self.insert_descriptor(index, self.chunk_max_capacity);
        Ok(self.locator_at(index, locator.offset + desc.size))
    }

    // -----------------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------------

    /// Insert an empty chunk before the located one; returns its locator.
    pub fn insert_prior_chunk(&mut self, locator: &Locator, required_capacity: u64) -> Result<Locator> {
        self.check(locator)?;
        self.insert_descriptor(locator.index, required_capacity);
        Ok(self.locator_at(locator.index, locator.offset))
    }

    /// Insert an empty chunk after the located one; returns its locator.
    pub fn insert_next_chunk(&mut self, locator: &Locator, required_capacity: u64) -> Result<Locator> {
        let desc = *self.check(locator)?;
        let index = locator.index + 1;
        self.insert_descriptor(index, required_capacity);
        Ok(self.locator_at(index, locator.offset + desc.size))
    }

    /// Split the located chunk so that `position` becomes a chunk boundary.
    ///
    /// The bytes `[position, chunk end)` move into a new max-capacity chunk
    /// inserted right after. At either edge of the chunk no data moves and an
    /// empty chunk is inserted before/after instead. Returns a locator to the
    /// original chunk, which now ends at `position`.
    pub fn split_chunk(&mut self, locator: &Locator, position: u64) -> Result<Locator> {
        let desc = *self.check(locator)?;
        let start = locator.offset;
        let end = start + desc.size;
        if position < start || position > end {
            return Err(StoreError::out_of_range(
                "split position",
                format_args!("{position} (chunk spans {start}..{end})"),
            ));
        }
        if position == start {
            self.insert_prior_chunk(locator, self.chunk_max_capacity)?;
            return Ok(self.locator_at(locator.index + 1, start));
        }
        if position == end {
            self.insert_next_chunk(locator, self.chunk_max_capacity)?;
            return Ok(self.locator_at(locator.index, start));
        }

        self.insert_descriptor(locator.index + 1, self.chunk_max_capacity);
        let moved = self.move_tail(locator.index, position - start, locator.index + 1)?;
        self.bump_version();
        self.stats.splits += 1;
        debug!(
            chunk = %desc.id,
            index = locator.index,
            position,
            moved,
            version = self.version,
            "chunk split"
        );
        Ok(self.locator_at(locator.index, start))
    }

    /// Fold the following chunk into the located one when its bytes fit in
    /// the located chunk's spare capacity. Re-stamps `locator` on success.
    pub fn merge_next_chunk(&mut self, locator: &mut Locator) -> Result<bool> {
        let desc = *self.check(locator)?;
        let next_index = locator.index + 1;
        let Some(next) = self.descriptors.get(next_index).copied() else {
            return Ok(false);
        };
        if next.size > desc.spare() {
            return Ok(false);
        }

        let moved = self.move_tail(next_index, 0, locator.index)?;
        let removed = self.descriptors.remove(next_index);
        let store = self.chunks.remove(&removed.id).map(Chunk::into_store);
        self.bump_version();
        self.stats.merged += 1;
        debug!(
            chunk = %desc.id,
            absorbed = %removed.id,
            moved,
            version = self.version,
            "chunk merged"
        );
        self.factory.destroy(removed.id, store)?;
        *locator = self.locator_at(locator.index, locator.offset);
        Ok(true)
    }

    /// Remove the located chunk and its bytes.
    ///
    /// Returns a locator to the chunk that now occupies the same index (the
    /// former successor), or `None` if the removed chunk was the last.
    pub fn remove_chunk(&mut self, locator: &Locator) -> Result<Option<Locator>> {
        self.check(locator)?;
        let desc = self.descriptors.remove(locator.index);
        let store = self.chunks.remove(&desc.id).map(Chunk::into_store);
        self.bump_version();
        self.stats.removed += 1;
        debug!(
            chunk = %desc.id,
            index = locator.index,
            size = desc.size,
            version = self.version,
            "chunk removed"
        );
        self.factory.destroy(desc.id, store)?;
        Ok((locator.index < self.descriptors.len())
            .then(|| self.locator_at(locator.index, locator.offset)))
    }

    /// Drop every chunk and reset the version.
    ///
    /// Chunk ids keep increasing across a clear, so locators issued before it
    /// stay invalid even once the version catches up again. Every chunk is
    /// handed to the factory for destruction; the first failure is returned
    /// after the rest have been attempted.
    pub fn clear(&mut self) -> Result<()> {
        let descriptors = std::mem::take(&mut self.descriptors);
        let mut chunks = std::mem::take(&mut self.chunks);
        self.version = INITIAL_VERSION;
        self.stats.removed += descriptors.len() as u64;
        debug!(removed = descriptors.len(), "chunk manager cleared");
        let mut first_err = None;
        for desc in descriptors {
            let store = chunks.remove(&desc.id).map(Chunk::into_store);
            if let Err(err) = self.factory.destroy(desc.id, store) {
                debug!(chunk = %desc.id, error = %err, "chunk destroy failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Flush and drop materialised chunk stores so that only descriptors stay
    /// resident. A no-op for factories whose stores cannot be reopened.
    pub fn release_chunks(&mut self) -> Result<usize> {
        if !F::PERSISTENT {
            return Ok(0);
        }
        let mut released = 0;
        for (_, mut chunk) in self.chunks.drain() {
            chunk.flush()?;
            released += 1;
        }
        debug!(released, "chunk stores released");
        Ok(released)
    }

    // -----------------------------------------------------------------------
    // Chunk access
    // -----------------------------------------------------------------------

    pub fn descriptor(&self, locator: &Locator) -> Result<ChunkDescriptor> {
        self.check(locator).copied()
    }

    pub fn is_last_chunk(&self, locator: &Locator) -> Result<bool> {
        self.check(locator)?;
        Ok(locator.index + 1 == self.descriptors.len())
    }

    /// Read from the located chunk at a chunk-relative offset.
    pub fn read_chunk(&mut self, locator: &Locator, from: u64, buf: &mut [u8]) -> Result<usize> {
        self.check(locator)?;
        self.chunk_at(locator.index)?.read(from, buf)
    }

    /// Write into the located chunk at a chunk-relative offset, clamped to the
    /// chunk's capacity.
    pub fn write_chunk(&mut self, locator: &mut Locator, from: u64, buf: &[u8]) -> Result<usize> {
        self.check(locator)?;
        let written = self.chunk_at(locator.index)?.write(from, buf)?;
        self.after_resize(locator)?;
        Ok(written)
    }

    /// Replace a chunk-relative range of the located chunk.
    pub fn replace_chunk_range(
        &mut self,
        locator: &mut Locator,
        from: u64,
        to: u64,
        buf: &[u8],
    ) -> Result<usize> {
        self.check(locator)?;
        let written = self.chunk_at(locator.index)?.replace_range(from, to, buf)?;
        self.after_resize(locator)?;
        Ok(written)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check(&self, locator: &Locator) -> Result<&ChunkDescriptor> {
        let stale = || StoreError::StaleLocator {
            captured: locator.version,
            current: self.version,
        };
        if locator.version != self.version {
            return Err(stale());
        }
        match self.descriptors.get(locator.index) {
            Some(desc) if desc.id == locator.id => Ok(desc),
            _ => Err(stale()),
        }
    }

    fn locator_at(&self, index: usize, offset: u64) -> Locator {
        Locator {
            index,
            id: self.descriptors[index].id,
            offset,
            version: self.version,
        }
    }

    fn scan(&self, position: u64) -> Option<Locator> {
        let last = self.descriptors.len().checked_sub(1)?;
        let mut offset = 0;
        for (index, desc) in self.descriptors.iter().enumerate() {
            let end = offset + desc.size;
            if position < end || (index == last && position == end) {
                return Some(self.locator_at(index, offset));
            }
            offset = end;
        }
        None
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }

    fn insert_descriptor(&mut self, index: usize, required_capacity: u64) -> ChunkId {
        let capacity = required_capacity.clamp(1, self.chunk_max_capacity);
        let id = self.next_id;
        self.next_id = id.next();
        self.descriptors.insert(index, ChunkDescriptor::new(id, capacity));
        self.bump_version();
        self.stats.created += 1;
        debug!(chunk = %id, index, capacity, version = self.version, "chunk created");
        id
    }

    fn chunk_at(&mut self, index: usize) -> Result<&mut Chunk<F::Store>> {
        let desc = self.descriptors.get_mut(index).ok_or_else(|| {
            StoreError::internal(format_args!("chunk index {index} out of bounds"))
        })?;
        match self.chunks.entry(desc.id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let store = if desc.materialized {
                    self.factory.open(desc.id, desc.capacity)?
                } else {
                    self.factory.create(desc.id, desc.capacity)?
                };
                desc.materialized = true;
                Ok(entry.insert(Chunk::new(store, desc.capacity)))
            }
        }
    }

    /// Copy the chunk's store size back into its descriptor.
    fn sync_size(&mut self, index: usize) -> Result<bool> {
        let desc = self.descriptors.get_mut(index).ok_or_else(|| {
            StoreError::internal(format_args!("chunk index {index} out of bounds"))
        })?;
        let Some(chunk) = self.chunks.get(&desc.id) else {
            return Ok(false);
        };
        let size = chunk.size();
        if size == desc.size {
            return Ok(false);
        }
        desc.size = size;
        Ok(true)
    }

    fn after_resize(&mut self, locator: &mut Locator) -> Result<()> {
        if self.sync_size(locator.index)? {
            self.bump_version();
            locator.version = self.version;
        }
        Ok(())
    }

    /// Append the bytes `[src_from, src end)` of chunk `src` to chunk `dst`
    /// in bounded steps, then truncate `src` at `src_from`.
    fn move_tail(&mut self, src: usize, src_from: u64, dst: usize) -> Result<u64> {
        let src_size = self.descriptors[src].size;
        let total = src_size - src_from;
        if total == 0 {
            return Ok(0);
        }
        let mut step = vec![0_u8; total.min(SPLIT_COPY_STEP as u64) as usize];
        let mut moved = 0;
        while moved < total {
            let n = (total - moved).min(step.len() as u64) as usize;
            let read = self.chunk_at(src)?.read(src_from + moved, &mut step[..n])?;
            if read != n {
                return Err(StoreError::internal(format_args!(
                    "short read moving chunk bytes: wanted {n}, got {read}"
                )));
            }
            let target = self.chunk_at(dst)?;
            let at = target.size();
            let written = target.write(at, &step[..n])?;
            if written != n {
                return Err(StoreError::internal(format_args!(
                    "destination chunk overflowed: wanted {n}, took {written}"
                )));
            }
            moved += n as u64;
        }
        self.chunk_at(src)?.replace_range(src_from, src_size, &[])?;
        self.sync_size(src)?;
        self.sync_size(dst)?;
        Ok(total)
    }
}
