//! Heap element store.

use pagestore_error::{Result, StoreError, check_range_order};
use pagestore_types::{ElementStore, check_element_span, check_index};

/// A `Vec` behind the [`ElementStore`] contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecStore<T> {
    items: Vec<T>,
}

impl<T> Default for VecStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Clone> VecStore<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> From<Vec<T>> for VecStore<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T: Clone> ElementStore for VecStore<T> {
    type Item = T;

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&mut self, index: usize) -> Result<T> {
        check_index(index, self.items.len())?;
        Ok(self.items[index].clone())
    }

    fn get_range(&mut self, from: usize, to: usize, sink: &mut Vec<T>) -> Result<usize> {
        check_range_order(from, to)?;
        let len = self.items.len();
        if from > len {
            return Err(StoreError::out_of_range(
                "element range start",
                format_args!("{from} (len {len})"),
            ));
        }
        let to = to.min(len);
        sink.extend_from_slice(&self.items[from..to]);
        Ok(to - from)
    }

    fn replace_range(&mut self, from: usize, to: usize, items: &[T]) -> Result<()> {
        check_element_span(from, to, self.items.len())?;
        self.items.splice(from..to, items.iter().cloned());
        Ok(())
    }

    fn set(&mut self, index: usize, item: T) -> Result<()> {
        check_index(index, self.items.len())?;
        self.items[index] = item;
        Ok(())
    }
}
