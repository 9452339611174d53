//! Driver Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A driver error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The aux log could not be parsed.
    #[display("failed to parse aux file")]
    Aux,
    /// The cache database could not be opened, checked, rebuilt, or queried.
    #[display("cache database failure")]
    Cache,
    /// The generated bibliography could not be written.
    #[display("failed to write generated bibliography")]
    Output,
    /// The aux log could not be redirected at the generated bibliography.
    #[display("failed to redirect aux file")]
    Redirect,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
