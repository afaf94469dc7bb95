use pagestore_error::Result;
use pagestore_types::{ByteStore, check_position, check_span};

/// A byte store clamped to a fixed capacity.
///
/// `write` and `replace_range` accept only as many bytes as fit and report
/// the count actually taken; callers route the remainder elsewhere.
#[derive(Debug)]
pub struct Chunk<S> {
    store: S,
    capacity: u64,
}

impl<S: ByteStore> Chunk<S> {
    #[must_use]
    pub const fn new(store: S, capacity: u64) -> Self {
        Self { store, capacity }
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes that can still be added before the chunk is full.
    #[inline]
    #[must_use]
    pub fn spare(&self) -> u64 {
        self.capacity.saturating_sub(self.store.size())
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: ByteStore> ByteStore for Chunk<S> {
    fn size(&self) -> u64 {
        self.store.size()
    }

    fn read(&mut self, from: u64, buf: &mut [u8]) -> Result<usize> {
        self.store.read(from, buf)
    }

    fn write(&mut self, from: u64, buf: &[u8]) -> Result<usize> {
        check_position(from, self.store.size())?;
        let room = self.capacity.saturating_sub(from);
        let n = (buf.len() as u64).min(room) as usize;
        if n == 0 {
            return Ok(0);
        }
        self.store.write(from, &buf[..n])
    }

    fn replace_range(&mut self, from: u64, to: u64, buf: &[u8]) -> Result<usize> {
        let size = self.store.size();
        check_span(from, to, size)?;
        let room = self.capacity.saturating_sub(size - (to - from));
        let n = (buf.len() as u64).min(room) as usize;
        self.store.replace_range(from, to, &buf[..n])
    }

    fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }
}
