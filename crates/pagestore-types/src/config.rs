//! Tunables for chunking and buffering.
//!
//! Both configs validate eagerly: an invalid value is rejected when the config
//! is built (or re-checked via `validate()` after deserialisation), never at
//! first use.

use pagestore_error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// Default maximum chunk capacity (64 KiB).
pub const DEFAULT_CHUNK_MAX_CAPACITY: u64 = 64 * 1024;
/// Default buffer page width, in elements.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
/// Default hard cap on buffered elements before a forced flush.
pub const DEFAULT_BUFFER_MAX_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    chunk_max_capacity: u64,
}

impl ChunkConfig {
    pub fn new(chunk_max_capacity: u64) -> Result<Self> {
        let config = Self { chunk_max_capacity };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_max_capacity == 0 {
            return Err(StoreError::config("chunk_max_capacity must be > 0"));
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn chunk_max_capacity(&self) -> u64 {
        self.chunk_max_capacity
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_max_capacity: DEFAULT_CHUNK_MAX_CAPACITY,
        }
    }
}

/// Paging window tunables.
///
/// `buffer_size` is the page width used to pick load windows;
/// `buffer_max_size` bounds how far the window may grow through inserts
/// before it is committed and collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    buffer_size: usize,
    buffer_max_size: usize,
}

impl BufferConfig {
    pub fn new(buffer_size: usize, buffer_max_size: usize) -> Result<Self> {
        let config = Self {
            buffer_size,
            buffer_max_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Enforce `buffer_max_size > buffer_size >= 1`.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size < 1 {
            return Err(StoreError::config("buffer_size must be >= 1"));
        }
        if self.buffer_max_size <= self.buffer_size {
            return Err(StoreError::config(format_args!(
                "buffer_max_size ({}) must exceed buffer_size ({})",
                self.buffer_max_size, self.buffer_size
            )));
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    #[inline]
    #[must_use]
    pub const fn buffer_max_size(&self) -> usize {
        self.buffer_max_size
    }

    pub fn with_buffer_size(self, buffer_size: usize) -> Result<Self> {
        Self::new(buffer_size, self.buffer_max_size)
    }

    pub fn with_buffer_max_size(self, buffer_max_size: usize) -> Result<Self> {
        Self::new(self.buffer_size, buffer_max_size)
    }

    /// Start index of the page containing `index`.
    #[inline]
    #[must_use]
    pub const fn page_start(&self, index: usize) -> usize {
        (index / self.buffer_size) * self.buffer_size
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            buffer_max_size: DEFAULT_BUFFER_MAX_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ChunkConfig::default().validate().is_ok());
        assert!(BufferConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_chunk_capacity_rejected() {
        assert!(
            ChunkConfig::new(0).unwrap_err().is_config(),
            "case=zero_chunk_capacity"
        );
    }

    #[test]
    fn buffer_bounds_are_strict() {
        assert!(BufferConfig::new(0, 4).unwrap_err().is_config(), "case=zero_page");
        assert!(
            BufferConfig::new(8, 8).unwrap_err().is_config(),
            "case=max_equal_to_page"
        );
        assert!(BufferConfig::new(1, 2).is_ok(), "case=minimal_valid");
    }

    #[test]
    fn page_start_rounds_down() {
        let config = BufferConfig::new(10, 20).unwrap();
        assert_eq!(config.page_start(0), 0);
        assert_eq!(config.page_start(9), 0);
        assert_eq!(config.page_start(10), 10);
        assert_eq!(config.page_start(537), 530, "case=page_start_mid");
    }

    #[test]
    fn deserialized_config_is_revalidated() {
        let config: BufferConfig =
            serde_json::from_str(r#"{"buffer_size": 16, "buffer_max_size": 4}"#).unwrap();
        assert!(
            config.validate().unwrap_err().is_config(),
            "case=deserialized_invalid_config"
        );

        let json = serde_json::to_string(&ChunkConfig::new(512).unwrap()).unwrap();
        assert_eq!(json, r#"{"chunk_max_capacity":512}"#);
    }
}
