//! Element index to byte position translation.

use pagestore_error::{Result, StoreError};
use pagestore_types::{ByteStore, check_element_span};

/// Views a byte store as an array of `element_size`-byte records.
///
/// Buffers handed to the read/write/replace methods must hold a whole number
/// of elements. The wrapped store's size stays a multiple of `element_size`
/// as long as it is only mutated through this view.
#[derive(Debug)]
pub struct AlignedByteStore<S> {
    store: S,
    element_size: usize,
}

impl<S: ByteStore> AlignedByteStore<S> {
    /// Wrap `store`, whose current size must be a multiple of `element_size`.
    pub fn new(store: S, element_size: usize) -> Result<Self> {
        if element_size == 0 {
            return Err(StoreError::config("element_size must be > 0"));
        }
        let size = store.size();
        if size % element_size as u64 != 0 {
            return Err(StoreError::config(format_args!(
                "store size {size} is not a multiple of element_size {element_size}"
            )));
        }
        Ok(Self {
            store,
            element_size,
        })
    }

    #[inline]
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.element_size
    }

    /// Number of whole elements.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.store.size() / self.element_size as u64) as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.size() == 0
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    #[inline]
    fn byte_position(&self, index: usize) -> u64 {
        index as u64 * self.element_size as u64
    }

    fn check_whole(&self, len: usize) -> Result<()> {
        if len % self.element_size != 0 {
            return Err(StoreError::invalid_argument(format_args!(
                "buffer of {len} bytes is not a whole number of {}-byte elements",
                self.element_size
            )));
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(StoreError::out_of_range(
                "element position",
                format_args!("{index} (len {len})"),
            ));
        }
        Ok(())
    }

    /// Read whole elements starting at `from`; returns the element count.
    pub fn read(&mut self, from: usize, buf: &mut [u8]) -> Result<usize> {
        self.check_whole(buf.len())?;
        self.check_index(from)?;
        let bytes = self.store.read(self.byte_position(from), buf)?;
        Ok(bytes / self.element_size)
    }

    /// Overwrite (and extend) elements starting at `from`.
    pub fn write(&mut self, from: usize, buf: &[u8]) -> Result<usize> {
        self.check_whole(buf.len())?;
        self.check_index(from)?;
        let bytes = self.store.write(self.byte_position(from), buf)?;
        Ok(bytes / self.element_size)
    }

    /// Replace elements `[from, to)` with the records in `buf`.
    pub fn replace_range(&mut self, from: usize, to: usize, buf: &[u8]) -> Result<usize> {
        self.check_whole(buf.len())?;
        check_element_span(from, to, self.len())?;
        let bytes =
            self.store
                .replace_range(self.byte_position(from), self.byte_position(to), buf)?;
        Ok(bytes / self.element_size)
    }

    pub fn remove_range(&mut self, from: usize, to: usize) -> Result<()> {
        self.replace_range(from, to, &[]).map(|_| ())
    }

    pub fn insert(&mut self, at: usize, buf: &[u8]) -> Result<usize> {
        self.replace_range(at, at, buf)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagestore_chunk::ChunkedByteStore;
    use pagestore_vfs::MemoryByteStore;

    #[test]
    fn construction_validates_element_size() {
        let err = AlignedByteStore::new(MemoryByteStore::new(), 0).unwrap_err();
        assert!(err.is_config(), "case=zero_element_size");

        let odd = MemoryByteStore::from_vec(vec![0; 7]);
        assert!(
            AlignedByteStore::new(odd, 4).unwrap_err().is_config(),
            "case=size_not_multiple"
        );

        let even = AlignedByteStore::new(MemoryByteStore::from_vec(vec![0; 8]), 4).unwrap();
        assert_eq!(even.len(), 2);
    }

    #[test]
    fn element_positions_scale_by_size() {
        let mut store = AlignedByteStore::new(MemoryByteStore::new(), 2).unwrap();
        store.write(0, b"aabbcc").unwrap();
        store.insert(1, b"XX").unwrap();
        assert_eq!(store.store().as_slice(), b"aaXXbbcc");
        assert_eq!(store.len(), 4);

        let mut buf = [0_u8; 4];
        assert_eq!(store.read(2, &mut buf).unwrap(), 2, "case=elements_not_bytes");
        assert_eq!(&buf, b"bbcc");

        store.remove_range(0, 2).unwrap();
        assert_eq!(store.store().as_slice(), b"bbcc");
    }

    #[test]
    fn partial_elements_are_rejected() {
        let mut store = AlignedByteStore::new(MemoryByteStore::new(), 4).unwrap();
        let err = store.write(0, b"abc").unwrap_err();
        assert!(
            matches!(err, StoreError::InvalidArgument(_)),
            "case=partial_write"
        );
        let mut buf = [0_u8; 6];
        assert!(matches!(
            store.read(0, &mut buf),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(store.is_empty(), "case=nothing_written");
    }

    #[test]
    fn indices_are_checked_in_elements() {
        let mut store = AlignedByteStore::new(MemoryByteStore::new(), 4).unwrap();
        store.write(0, &[1; 8]).unwrap();
        assert!(store.write(3, &[0; 4]).unwrap_err().is_out_of_range());
        assert!(store.replace_range(1, 3, &[]).unwrap_err().is_out_of_range());
        assert!(matches!(
            store.replace_range(2, 1, &[]),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn works_over_chunked_store() {
        let chunked = ChunkedByteStore::with_memory_chunks(6).unwrap();
        let mut store = AlignedByteStore::new(chunked, 4).unwrap();
        for i in 0..10_u32 {
            store.insert(0, &i.to_le_bytes()).unwrap();
        }
        assert_eq!(store.len(), 10);
        let mut record = [0_u8; 4];
        store.read(3, &mut record).unwrap();
        assert_eq!(u32::from_le_bytes(record), 6, "case=records_straddle_chunks");
    }
}
