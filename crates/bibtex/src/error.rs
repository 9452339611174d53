//! BibTeX Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A BibTeX error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for BibTeX operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source text does not follow the BibTeX grammar.
    #[display("syntax error at line {line}: expected {expected}")]
    Syntax {
        /// 1-based line of the offending input.
        line: usize,
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// The input ended in the middle of an entry, value, or braced group.
    #[display("unexpected end of input at line {_0}")]
    UnexpectedEof(#[error(not(source))] usize),
    /// A bare identifier in a value position had no `@string` definition.
    #[display("undefined string macro '{name}' at line {line}")]
    UndefinedMacro {
        /// The macro name, lowercased.
        name: String,
        /// 1-based line of the reference.
        line: usize,
    },
    /// The same citation key was defined twice within one file.
    #[display("duplicate citation key '{_0}' within a single file")]
    DuplicateKey(#[error(not(source))] String),
    /// A field value has unbalanced braces. Only raised by the strict writer.
    #[display("unbalanced braces in field '{_0}'")]
    UnbalancedBraces(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The source text is either valid BibTeX or it's not.
        false
    }
}
