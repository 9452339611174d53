//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A source file could not be stat'ed for its modification time.
    #[display("cannot stat source file: {}", _0.display())]
    Stat(#[error(not(source))] PathBuf),
    /// A source file could not be read.
    #[display("cannot read source file: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// A source file is not valid BibTeX.
    #[display("malformed bibliography file: {}", _0.display())]
    Parse(#[error(not(source))] PathBuf),
    /// Two source files define the same citation key. This is a configuration
    /// mistake the caller must fix; it is never resolved by precedence.
    #[display("duplicate citation key '{key}' (first defined in {}, again in {})", first.display(), second.display())]
    DuplicateKey {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },
    /// An entry could not be serialized for storage.
    #[display("cannot serialize entry '{_0}'")]
    Serialize(#[error(not(source))] String),
    /// Stored or derived data that doesn't fit the schema.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
