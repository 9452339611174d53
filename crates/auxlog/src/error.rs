//! Aux Log Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An aux-log error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for aux-log operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The aux log could not be read.
    #[display("cannot read aux file: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The rewritten aux log could not be written or renamed into place.
    #[display("cannot rewrite aux file: {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    /// `\bibdata` appeared more than once; only one list is supported.
    #[display(r"\bibdata present twice in aux file")]
    DuplicateBibData,
    /// The redirect marker appeared twice, or after a `\bibdata` line.
    #[display(r"redirect marker present twice or after \bibdata in aux file")]
    DuplicateRedirectMarker,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
