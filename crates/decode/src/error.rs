//! Decoding Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Almost everything in this crate is total (every name has
//! a decoding), so the only error source is strict description parsing.

use derive_more::{Display, Error};

/// A decoding error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for decoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A `"key":` boundary was recognised but the pair that follows is broken.
    #[display("malformed description pair at byte {offset}: {reason}")]
    MalformedPair {
        /// Byte offset of the opening quote of the key.
        offset: usize,
        /// What was wrong with the pair.
        reason: &'static str,
    },
    /// A vocabulary token could not be parsed.
    #[display("unknown {field} token: {value}")]
    UnknownToken {
        /// Which vocabulary was consulted.
        field: &'static str,
        /// The offending token.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Input text is either well-formed or it isn't.
        false
    }
}
