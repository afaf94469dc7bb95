//! Index-addressed element store contract.

use pagestore_error::{Result, StoreError, check_range_order};

/// A sequence of elements addressed by `usize` index.
///
/// This is the "main store" shape the paging layer buffers in front of, and
/// also the shape of the in-memory buffer store itself.
pub trait ElementStore {
    type Item: Clone;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`; out-of-range indices are errors.
    fn get(&mut self, index: usize) -> Result<Self::Item>;

    /// Append `[from, min(to, len))` to `sink`, returning the count appended.
    ///
    /// `from` may equal `len` (nothing is appended) but may not exceed it.
    fn get_range(&mut self, from: usize, to: usize, sink: &mut Vec<Self::Item>) -> Result<usize>;

    /// Replace `[from, to)` with `items`.
    fn replace_range(&mut self, from: usize, to: usize, items: &[Self::Item]) -> Result<()>;

    fn remove_range(&mut self, from: usize, to: usize) -> Result<()> {
        self.replace_range(from, to, &[])
    }

    fn insert(&mut self, index: usize, item: Self::Item) -> Result<()> {
        self.replace_range(index, index, std::slice::from_ref(&item))
    }

    fn push(&mut self, item: Self::Item) -> Result<()> {
        let len = self.len();
        self.insert(len, item)
    }

    fn set(&mut self, index: usize, item: Self::Item) -> Result<()> {
        check_index(index, self.len())?;
        self.replace_range(index, index + 1, std::slice::from_ref(&item))
    }
}

impl<T: ElementStore + ?Sized> ElementStore for &mut T {
    type Item = T::Item;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&mut self, index: usize) -> Result<Self::Item> {
        (**self).get(index)
    }

    fn get_range(&mut self, from: usize, to: usize, sink: &mut Vec<Self::Item>) -> Result<usize> {
        (**self).get_range(from, to, sink)
    }

    fn replace_range(&mut self, from: usize, to: usize, items: &[Self::Item]) -> Result<()> {
        (**self).replace_range(from, to, items)
    }

    fn insert(&mut self, index: usize, item: Self::Item) -> Result<()> {
        (**self).insert(index, item)
    }

    fn set(&mut self, index: usize, item: Self::Item) -> Result<()> {
        (**self).set(index, item)
    }
}

/// Reject `index >= len`.
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(StoreError::out_of_range(
            "element index",
            format_args!("{index} (len {len})"),
        ));
    }
    Ok(())
}

/// Validate an element span `[from, to)` against `len`.
pub fn check_element_span(from: usize, to: usize, len: usize) -> Result<()> {
    check_range_order(from, to)?;
    if to > len {
        return Err(StoreError::out_of_range(
            "element range end",
            format_args!("{to} (len {len})"),
        ));
    }
    Ok(())
}
