use pagestore_error::Result;
use pagestore_types::{ByteStore, check_position, check_span};

/// Heap-backed byte store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryByteStore {
    data: Vec<u8>,
}

impl MemoryByteStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Empty store with room for `capacity` bytes before reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub const fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl ByteStore for MemoryByteStore {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&mut self, from: u64, buf: &mut [u8]) -> Result<usize> {
        check_position(from, self.size())?;
        let start = from as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn write(&mut self, from: u64, buf: &[u8]) -> Result<usize> {
        check_position(from, self.size())?;
        let start = from as usize;
        let overlap = buf.len().min(self.data.len() - start);
        self.data[start..start + overlap].copy_from_slice(&buf[..overlap]);
        self.data.extend_from_slice(&buf[overlap..]);
        Ok(buf.len())
    }

    fn replace_range(&mut self, from: u64, to: u64, buf: &[u8]) -> Result<usize> {
        check_span(from, to, self.size())?;
        let (from, to) = (from as usize, to as usize);
        if to - from == buf.len() {
            self.data[from..to].copy_from_slice(buf);
        } else {
            self.data.splice(from..to, buf.iter().copied());
        }
        Ok(buf.len())
    }
}
