//! Cached BibTeX processing for LaTeX document builds.
//!
//! One run of the driver: parse the document's aux log for the ordered
//! bibliography file list and the cited keys, bring the entry cache up to
//! date (a wholesale rebuild when any source file was added, removed,
//! reordered, or touched), emit the cited entries into a generated `.bib`,
//! and redirect the aux log at it so the subsequent `bibtex` invocation only
//! sees the handful of entries it actually needs.

pub mod error;
mod run;

pub use crate::run::{Outcome, run};
