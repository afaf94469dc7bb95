//! Paging layer.
//!
//! A [`Buffer`] mirrors one contiguous window of a main element store and
//! tracks whether it has diverged from it. [`BufferedStore`] decides when to
//! load, commit and collapse that window so that bursts of local edits reach
//! the main store as a few range replacements.

pub mod buffer;
pub mod store;

pub use buffer::{Buffer, BufferStats};
pub use store::BufferedStore;
