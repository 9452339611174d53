//! BibTeX parsing and serialization.
//!
//! This crate turns `.bib` source text into an ordered [`Bibliography`] of
//! [`Entry`] values and serializes entries back to their textual form. Field
//! declaration order is preserved end to end, which is what makes re-serialized
//! output deterministic across rebuilds of the same sources.
//!
//! Serialization goes through [`Writer`], which carries an explicit
//! `trusted_input` capability: the fast path skips brace-balance validation and
//! must only ever round-trip output of [`Parser`], never hand-edited text.

pub mod error;
mod models;
mod parse;
mod write;

pub use crate::models::{Bibliography, Entry, Field, PersonField};
pub use crate::parse::{DEFAULT_PERSON_ROLES, Parser};
pub use crate::write::Writer;
