//! The paging window and its load/commit/collapse protocol.

use pagestore_error::{Result, StoreError, check_range_order};
use pagestore_types::ElementStore;
use tracing::debug;

/// Window transition counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub loads: u64,
    /// Elements fetched from the main store by loads.
    pub loaded: u64,
    pub commits: u64,
    /// Elements written back to the main store by commits.
    pub committed: u64,
    pub collapses: u64,
}

/// A window of the main store's elements held in a secondary store.
///
/// The window starts at `main_offset` (`None` while unbound). Its first
/// `main_count` elements in main-store terms are what the buffer replaces
/// on commit; the buffer's current length may differ once elements are
/// inserted or removed locally. All indices taken by the element methods are
/// logical (main-store) indices.
#[derive(Debug)]
pub struct Buffer<B> {
    store: B,
    main_offset: Option<usize>,
    main_count: usize,
    modified: bool,
    stats: BufferStats,
}

impl<B: ElementStore> Buffer<B> {
    /// Wrap an empty secondary store.
    pub fn new(store: B) -> Result<Self> {
        if !store.is_empty() {
            return Err(StoreError::invalid_argument(format_args!(
                "buffer store must start empty, holds {} elements",
                store.len()
            )));
        }
        Ok(Self {
            store,
            main_offset: None,
            main_count: 0,
            modified: false,
            stats: BufferStats::default(),
        })
    }

    #[inline]
    #[must_use]
    pub const fn main_offset(&self) -> Option<usize> {
        self.main_offset
    }

    #[inline]
    #[must_use]
    pub const fn main_count(&self) -> usize {
        self.main_count
    }

    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    #[inline]
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.main_offset.is_some()
    }

    /// Elements currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[must_use]
    pub const fn stats(&self) -> BufferStats {
        self.stats
    }

    /// Logical index one past the window.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        self.main_offset.map(|offset| offset + self.store.len())
    }

    /// `main_offset <= index < main_offset + len`.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.main_offset
            .is_some_and(|offset| offset <= index && index < offset + self.store.len())
    }

    /// `main_offset <= index <= main_offset + len`: an insert here stays in
    /// the window.
    #[must_use]
    pub fn can_add(&self, index: usize) -> bool {
        self.main_offset
            .is_some_and(|offset| offset <= index && index <= offset + self.store.len())
    }

    /// Whether `[from, to)` lies entirely inside the window.
    #[must_use]
    pub fn covers(&self, from: usize, to: usize) -> bool {
        self.main_offset
            .is_some_and(|offset| offset <= from && to <= offset + self.store.len())
    }

    /// Mirror main-store elements `[from, to)` (fewer if main is shorter).
    ///
    /// Loading over uncommitted changes is refused.
    pub fn load<M>(&mut self, main: &mut M, from: usize, to: usize) -> Result<usize>
    where
        M: ElementStore<Item = B::Item>,
    {
        if self.modified {
            return Err(StoreError::concurrent_modification(format_args!(
                "load of {from}..{to} over uncommitted window at {:?}",
                self.main_offset
            )));
        }
        let mut items = Vec::with_capacity(to.saturating_sub(from));
        let loaded = main.get_range(from, to, &mut items)?;
        self.reset_store()?;
        self.store.replace_range(0, 0, &items)?;
        self.main_offset = Some(from);
        self.main_count = loaded;
        self.stats.loads += 1;
        self.stats.loaded += loaded as u64;
        debug!(from, to, loaded, "buffer loaded");
        Ok(loaded)
    }

    /// Write the whole window back over `[main_offset, main_offset +
    /// main_count)`. Returns `false` (and touches nothing) when clean.
    pub fn commit<M>(&mut self, main: &mut M) -> Result<bool>
    where
        M: ElementStore<Item = B::Item>,
    {
        if !self.modified {
            return Ok(false);
        }
        let offset = self
            .main_offset
            .ok_or_else(|| StoreError::internal("modified buffer has no window"))?;
        let len = self.store.len();
        let mut items = Vec::with_capacity(len);
        self.store.get_range(0, len, &mut items)?;
        main.replace_range(offset, offset + self.main_count, &items)?;
        debug!(
            offset,
            replaced = self.main_count,
            written = len,
            "buffer committed"
        );
        self.main_count = len;
        self.modified = false;
        self.stats.commits += 1;
        self.stats.committed += len as u64;
        Ok(true)
    }

    /// Keep only the elements of `[from, to)` and re-anchor the window there.
    ///
    /// A non-empty range must lie inside the window; an empty one may anchor
    /// anywhere. Collapsing over uncommitted changes is refused.
    pub fn collapse(&mut self, from: usize, to: usize) -> Result<()> {
        if self.modified {
            return Err(StoreError::concurrent_modification(format_args!(
                "collapse to {from}..{to} would discard uncommitted changes"
            )));
        }
        check_range_order(from, to)?;
        if from == to {
            self.reset_store()?;
        } else {
            let offset = match self.main_offset {
                Some(offset) if self.covers(from, to) => offset,
                _ => {
                    return Err(StoreError::out_of_range(
                        "collapse range",
                        format_args!("{from}..{to} (window {:?}..{:?})", self.main_offset, self.end()),
                    ));
                }
            };
            let len = self.store.len();
            self.store.remove_range(to - offset, len)?;
            self.store.remove_range(0, from - offset)?;
        }
        self.main_offset = Some(from);
        self.main_count = to - from;
        self.stats.collapses += 1;
        debug!(from, to, "buffer collapsed");
        Ok(())
    }

    /// Drop all buffered content and unbind.
    pub fn clear(&mut self) -> Result<()> {
        self.reset_store()?;
        self.main_offset = None;
        self.main_count = 0;
        self.modified = false;
        Ok(())
    }

    /// Anchor an empty window over main `[from, to)` and fill it with
    /// `items`, so that the next commit replaces that range.
    pub fn anchor_replace(&mut self, from: usize, to: usize, items: &[B::Item]) -> Result<()> {
        check_range_order(from, to)?;
        if self.modified {
            return Err(StoreError::concurrent_modification(format_args!(
                "re-anchoring at {from}..{to} over uncommitted window"
            )));
        }
        self.reset_store()?;
        self.store.replace_range(0, 0, items)?;
        self.main_offset = Some(from);
        self.main_count = to - from;
        self.modified = true;
        Ok(())
    }

    pub fn get(&mut self, index: usize) -> Result<B::Item> {
        let rel = self.relative(index, false)?;
        self.store.get(rel)
    }

    pub fn set(&mut self, index: usize, item: B::Item) -> Result<()> {
        let rel = self.relative(index, false)?;
        self.store.set(rel, item)?;
        self.modified = true;
        Ok(())
    }

    pub fn insert(&mut self, index: usize, item: B::Item) -> Result<()> {
        let rel = self.relative(index, true)?;
        self.store.insert(rel, item)?;
        self.modified = true;
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<B::Item> {
        let rel = self.relative(index, false)?;
        let item = self.store.get(rel)?;
        self.store.remove_range(rel, rel + 1)?;
        self.modified = true;
        Ok(item)
    }

    /// Replace logical `[from, to)`, which must lie inside the window.
    pub fn replace_range(&mut self, from: usize, to: usize, items: &[B::Item]) -> Result<()> {
        check_range_order(from, to)?;
        let rel_from = self.relative(from, true)?;
        let rel_to = self.relative(to, true)?;
        self.store.replace_range(rel_from, rel_to, items)?;
        self.modified = true;
        Ok(())
    }

    fn relative(&self, index: usize, allow_end: bool) -> Result<usize> {
        let inside = if allow_end {
            self.can_add(index)
        } else {
            self.contains(index)
        };
        match self.main_offset {
            Some(offset) if inside => Ok(index - offset),
            _ => Err(StoreError::out_of_range(
                "buffer index",
                format_args!("{index} (window {:?}..{:?})", self.main_offset, self.end()),
            )),
        }
    }

    fn reset_store(&mut self) -> Result<()> {
        let len = self.store.len();
        if len > 0 {
            self.store.remove_range(0, len)?;
        }
        Ok(())
    }
}
