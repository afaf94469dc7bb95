//! Page-window policy over a main element store.

use pagestore_element::VecStore;
use pagestore_error::{Result, StoreError};
use pagestore_types::{BufferConfig, ElementStore, check_element_span, check_index};
use tracing::{debug, trace};

use crate::buffer::{Buffer, BufferStats};

/// An element store fronted by a paging [`Buffer`].
///
/// Reads and edits outside the current window commit it and load the page
/// (`buffer_size` elements, page-aligned) holding the target index. Inserts
/// grow the window in place until it reaches `buffer_max_size`, at which point
/// it is committed and collapsed just past the insertion point. `M` may be a
/// `&mut` borrow of a store owned elsewhere.
#[derive(Debug)]
pub struct BufferedStore<M: ElementStore, B> {
    main: M,
    buffer: Buffer<B>,
    config: BufferConfig,
}

impl<M: ElementStore> BufferedStore<M, VecStore<M::Item>> {
    /// Buffer `main` in a heap window.
    pub fn new(main: M, config: BufferConfig) -> Result<Self> {
        Self::with_buffer_store(main, VecStore::with_capacity(config.buffer_max_size()), config)
    }
}

impl<M, B> BufferedStore<M, B>
where
    M: ElementStore,
    B: ElementStore<Item = M::Item>,
{
    /// Buffer `main` in the (empty) element store `buffer_store`.
    pub fn with_buffer_store(main: M, buffer_store: B, config: BufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            main,
            buffer: Buffer::new(buffer_store)?,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> BufferConfig {
        self.config
    }

    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.config.buffer_size()
    }

    #[must_use]
    pub const fn buffer_max_size(&self) -> usize {
        self.config.buffer_max_size()
    }

    /// Change the page width. Commits and drops the current window.
    pub fn set_buffer_size(&mut self, buffer_size: usize) -> Result<()> {
        let config = self.config.with_buffer_size(buffer_size)?;
        self.reconfigure(config)
    }

    /// Change the window growth cap. Commits and drops the current window.
    pub fn set_buffer_max_size(&mut self, buffer_max_size: usize) -> Result<()> {
        let config = self.config.with_buffer_max_size(buffer_max_size)?;
        self.reconfigure(config)
    }

    /// Read-only view of the main store. Uncommitted edits are not visible
    /// through it; call [`Self::flush_buffer`] first.
    #[must_use]
    pub const fn main(&self) -> &M {
        &self.main
    }

    #[must_use]
    pub const fn buffer(&self) -> &Buffer<B> {
        &self.buffer
    }

    #[must_use]
    pub const fn stats(&self) -> BufferStats {
        self.buffer.stats()
    }

    /// Commit pending edits and hand back the main store.
    pub fn into_main(mut self) -> Result<M> {
        self.flush_buffer()?;
        Ok(self.main)
    }

    /// Logical length: main length with the window's net change applied.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.buffer.is_bound() {
            self.main.len() - self.buffer.main_count() + self.buffer.len()
        } else {
            self.main.len()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&mut self, index: usize) -> Result<M::Item> {
        self.page_in(index)?;
        self.buffer.get(index)
    }

    pub fn set(&mut self, index: usize, item: M::Item) -> Result<()> {
        self.page_in(index)?;
        self.buffer.set(index, item)
    }

    /// Remove and return the element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<M::Item> {
        self.page_in(index)?;
        self.buffer.remove(index)
    }

    pub fn insert(&mut self, index: usize, item: M::Item) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(StoreError::out_of_range(
                "element index",
                format_args!("{index} (len {len})"),
            ));
        }
        if !self.buffer.can_add(index) {
            self.load_page(index)?;
        }
        self.buffer.insert(index, item)?;
        if self.buffer.len() >= self.config.buffer_max_size() {
            self.buffer.commit(&mut self.main)?;
            // Anchor just past the new element so the next sequential insert
            // lands on the window without a reload.
            self.buffer.collapse(index + 1, index + 1)?;
        }
        Ok(())
    }

    /// Insert `items` one by one starting at `index`.
    pub fn add_range(&mut self, index: usize, items: &[M::Item]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            self.insert(index + i, item.clone())?;
        }
        Ok(())
    }

    pub fn push(&mut self, item: M::Item) -> Result<()> {
        let len = self.len();
        self.insert(len, item)
    }

    /// Replace `[from, to)` with `items`.
    ///
    /// A range inside the window is edited in memory. Otherwise the window is
    /// committed and re-anchored on the target range, so the edit reaches the
    /// main store with the next commit.
    pub fn replace_range(&mut self, from: usize, to: usize, items: &[M::Item]) -> Result<()> {
        check_element_span(from, to, self.len())?;
        let in_window = if from == to {
            self.buffer.can_add(from)
        } else {
            self.buffer.covers(from, to)
        };
        if in_window {
            self.buffer.replace_range(from, to, items)?;
        } else {
            trace!(from, to, "replace outside window");
            self.buffer.commit(&mut self.main)?;
            self.buffer.clear()?;
            self.buffer.anchor_replace(from, to, items)?;
        }
        if self.buffer.len() >= self.config.buffer_max_size() {
            self.flush_buffer()?;
        }
        Ok(())
    }

    pub fn remove_range(&mut self, from: usize, to: usize) -> Result<()> {
        self.replace_range(from, to, &[])
    }

    /// Copy `[from, min(to, len))` into `sink`. Pending edits are committed
    /// first; the window stays loaded.
    pub fn get_range(&mut self, from: usize, to: usize, sink: &mut Vec<M::Item>) -> Result<usize> {
        self.buffer.commit(&mut self.main)?;
        self.main.get_range(from, to, sink)
    }

    /// Commit, then collapse to an empty window at its current end so that an
    /// append there needs no reload.
    pub fn flush_buffer(&mut self) -> Result<()> {
        self.buffer.commit(&mut self.main)?;
        if let Some(end) = self.buffer.end() {
            self.buffer.collapse(end, end)?;
        }
        Ok(())
    }

    fn reconfigure(&mut self, config: BufferConfig) -> Result<()> {
        self.buffer.commit(&mut self.main)?;
        self.buffer.clear()?;
        debug!(
            buffer_size = config.buffer_size(),
            buffer_max_size = config.buffer_max_size(),
            "buffer reconfigured"
        );
        self.config = config;
        Ok(())
    }

    /// Commit the window and load the page holding `index`.
    fn load_page(&mut self, index: usize) -> Result<()> {
        self.buffer.commit(&mut self.main)?;
        let from = self.config.page_start(index);
        let to = from + self.config.buffer_size();
        self.buffer.load(&mut self.main, from, to)?;
        Ok(())
    }

    /// Make sure the window holds the existing element at `index`.
    ///
    /// Bounds are checked against the logical length first, so a bad index
    /// never commits or reloads the window.
    fn page_in(&mut self, index: usize) -> Result<()> {
        check_index(index, self.len())?;
        if !self.buffer.contains(index) {
            self.load_page(index)?;
        }
        Ok(())
    }
}

impl<M, B> ElementStore for BufferedStore<M, B>
where
    M: ElementStore,
    B: ElementStore<Item = M::Item>,
{
    type Item = M::Item;

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn get(&mut self, index: usize) -> Result<M::Item> {
        Self::get(self, index)
    }

    fn get_range(&mut self, from: usize, to: usize, sink: &mut Vec<M::Item>) -> Result<usize> {
        Self::get_range(self, from, to, sink)
    }

    fn replace_range(&mut self, from: usize, to: usize, items: &[M::Item]) -> Result<()> {
        Self::replace_range(self, from, to, items)
    }

    fn insert(&mut self, index: usize, item: M::Item) -> Result<()> {
        Self::insert(self, index, item)
    }

    fn set(&mut self, index: usize, item: M::Item) -> Result<()> {
        Self::set(self, index, item)
    }
}
