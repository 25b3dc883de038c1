//! Hierarchy Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Provider and cache failures are
//! raised as children of these kinds, so the full tree down to the I/O or
//! SQL error is preserved.

use derive_more::{Display, Error};
use std::time::Duration;

/// A hierarchy error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for hierarchy operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A provider call for this node failed; the subtree cannot be built.
    #[display("provider failed for node {id}")]
    Provider {
        #[error(not(source))]
        id: String,
    },
    /// Reading or writing the hierarchy cache failed.
    #[display("hierarchy cache error")]
    Cache,
    /// Building the hierarchy took longer than allowed. Nothing was cached.
    #[display("building hierarchy {root_id} timed out after {}ms", after.as_millis())]
    Timeout {
        #[error(not(source))]
        root_id: String,
        #[error(not(source))]
        after: Duration,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
