//! Random-access byte range contract.

use pagestore_error::{Result, StoreError, check_range_order};

/// A random-access store of bytes addressed by `u64` position.
///
/// Contract shared by every implementation:
/// - positions outside `[0, size()]` are [`StoreError::OutOfRange`];
/// - `from > to` is [`StoreError::InvalidArgument`];
/// - `write` overwrites and grows the store as needed, but never leaves a gap
///   (`from` must be `<= size()`);
/// - `replace_range` swaps the bytes in `[from, to)` for `buf`, shifting the
///   tail, and returns the number of bytes written.
pub trait ByteStore {
    /// Logical size in bytes.
    fn size(&self) -> u64;

    /// Copy bytes starting at `from` into `buf`; returns the count read, which
    /// is short only when the end of the store is reached.
    fn read(&mut self, from: u64, buf: &mut [u8]) -> Result<usize>;

    /// Overwrite bytes starting at `from`, growing the store past its end.
    fn write(&mut self, from: u64, buf: &[u8]) -> Result<usize>;

    /// Replace `[from, to)` with `buf`.
    fn replace_range(&mut self, from: u64, to: u64, buf: &[u8]) -> Result<usize>;

    /// Remove `[from, to)`.
    fn remove_range(&mut self, from: u64, to: u64) -> Result<()> {
        self.replace_range(from, to, &[]).map(|_| ())
    }

    /// Insert `buf` at `at`, shifting the tail.
    fn insert(&mut self, at: u64, buf: &[u8]) -> Result<usize> {
        self.replace_range(at, at, buf)
    }

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Release hook: push buffered state down and drop held resources.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: ByteStore + ?Sized> ByteStore for &mut T {
    fn size(&self) -> u64 {
        (**self).size()
    }

    fn read(&mut self, from: u64, buf: &mut [u8]) -> Result<usize> {
        (**self).read(from, buf)
    }

    fn write(&mut self, from: u64, buf: &[u8]) -> Result<usize> {
        (**self).write(from, buf)
    }

    fn replace_range(&mut self, from: u64, to: u64, buf: &[u8]) -> Result<usize> {
        (**self).replace_range(from, to, buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: ByteStore + ?Sized> ByteStore for Box<T> {
    fn size(&self) -> u64 {
        (**self).size()
    }

    fn read(&mut self, from: u64, buf: &mut [u8]) -> Result<usize> {
        (**self).read(from, buf)
    }

    fn write(&mut self, from: u64, buf: &[u8]) -> Result<usize> {
        (**self).write(from, buf)
    }

    fn replace_range(&mut self, from: u64, to: u64, buf: &[u8]) -> Result<usize> {
        (**self).replace_range(from, to, buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Reject a position beyond `size`.
pub fn check_position(position: u64, size: u64) -> Result<()> {
    if position > size {
        return Err(StoreError::out_of_range(
            "byte position",
            format_args!("{position} (size {size})"),
        ));
    }
    Ok(())
}

/// Validate a `[from, to)` span against `size`.
pub fn check_span(from: u64, to: u64, size: u64) -> Result<()> {
    check_range_order(from, to)?;
    check_position(to, size)
}
