//! SQLite cache of parsed, serialized BibTeX entries.
//!
//! The cache owns exactly two tables: the ordered list of source files it was
//! built from (`seq`, `path`, `mtime`) and the mapping from citation key to
//! ready-to-emit entry text. The recorded file list doubles as the staleness
//! oracle - any difference against the caller's current list (count, order,
//! paths, or modification times) invalidates the whole cache. The only
//! mutation path is a wholesale rebuild inside one transaction; there is no
//! per-entry update or deletion.

mod db;
pub mod error;
mod manifest;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{CachedEntry, SourceFile};
pub use crate::repo::Repository;
