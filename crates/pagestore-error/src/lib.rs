//! Error taxonomy for the chunked store and paging layers.
//!
//! Every precondition violation is surfaced to the caller as one of these
//! variants; no layer retries or silently clamps. Leaf I/O failures travel
//! through unchanged as [`StoreError::Io`].

use std::fmt;

/// Primary error type for all pagestore crates.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A position or index fell outside the bounds valid for the operation.
    #[error("{what} out of range: {value}")]
    OutOfRange { what: String, value: String },

    /// An argument was malformed (e.g. `from > to`, partial-element buffer).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A chunk locator was used after a structural edit invalidated it.
    #[error("stale locator: captured version {captured}, current version {current}")]
    StaleLocator { captured: u64, current: u64 },

    /// The buffer's load/commit/collapse ordering was violated.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    /// A tunable was rejected at configuration time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A marshaller produced a record whose length differs from its fixed size.
    #[error("encoding error: expected {expected} bytes, got {actual}")]
    Encoding { expected: usize, actual: usize },

    /// Failure reported by a leaf byte store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal invariant was broken.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Build an [`StoreError::Internal`] from any displayable message.
    #[must_use]
    pub fn internal(msg: impl fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }

    /// Build an [`StoreError::OutOfRange`] naming the offending quantity.
    #[must_use]
    pub fn out_of_range(what: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::OutOfRange {
            what: what.into(),
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_argument(msg: impl fmt::Display) -> Self {
        Self::InvalidArgument(msg.to_string())
    }

    #[must_use]
    pub fn config(msg: impl fmt::Display) -> Self {
        Self::Config(msg.to_string())
    }

    #[must_use]
    pub fn concurrent_modification(msg: impl fmt::Display) -> Self {
        Self::ConcurrentModification(msg.to_string())
    }

    #[must_use]
    pub const fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }

    #[must_use]
    pub const fn is_stale_locator(&self) -> bool {
        matches!(self, Self::StaleLocator { .. })
    }

    #[must_use]
    pub const fn is_concurrent_modification(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Reject `from > to` ranges.
pub fn check_range_order<T: PartialOrd + fmt::Display>(from: T, to: T) -> Result<()> {
    if from > to {
        return Err(StoreError::invalid_argument(format!(
            "range start {from} exceeds range end {to}"
        )));
    }
    Ok(())
}
