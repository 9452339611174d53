//! Parsing and rewriting of the LaTeX auxiliary log.
//!
//! The aux log is the handoff point between the document build and the
//! bibliography processor: [`parse`] recovers the ordered bibliography file
//! list and the cited keys, and [`redirect`] points the log's `\bibdata` at a
//! generated bibliography while keeping the original list behind a
//! `%\bibcachedata` comment marker so later runs still know what to check
//! for staleness.

mod consts;
pub mod error;
mod parse;
mod rewrite;

pub use crate::parse::{AuxData, canonical_bib_name, parse};
pub use crate::rewrite::redirect;
