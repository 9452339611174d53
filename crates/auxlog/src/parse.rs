//! Recovers the bibliography configuration from an aux log.

use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::consts;
use crate::error::{ErrorKind, Result};

/// What the aux log says about the bibliography.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxData {
    /// The ordered bibliography file list; position is significant.
    pub bib_files: Vec<PathBuf>,
    /// Cited keys in citation order, duplicates preserved.
    pub citations: Vec<String>,
}

/// Trim a bibliography file name and append the `.bib` extension when missing.
pub fn canonical_bib_name(name: &str) -> PathBuf {
    let name = name.trim();
    if name.ends_with(".bib") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{name}.bib"))
    }
}

/// Parse an aux log for `\citation` and `\bibdata` lines.
///
/// A `%\bibcachedata` marker (left behind by [`redirect`](crate::redirect))
/// wins over `\bibdata`: after a redirect, the marker still names the real
/// source list while `\bibdata` points at the generated file.
///
/// # Errors
///
/// Fails on an unreadable file, a second `\bibdata` line, or a marker that
/// appears twice or after `\bibdata` - competing file lists are a document
/// configuration problem, not something to pick a winner for.
#[instrument]
pub fn parse(path: &Path) -> Result<AuxData> {
    let contents = std::fs::read_to_string(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    parse_contents(&contents)
}

fn parse_contents(contents: &str) -> Result<AuxData> {
    let mut citations = Vec::new();
    let mut bib_files: Vec<PathBuf> = Vec::new();
    let mut redirected = false;
    for line in contents.lines() {
        if let Some(captures) = consts::CITATION_REGEX.captures(line) {
            citations.push(captures[1].to_string());
            continue;
        }
        if let Some(captures) = consts::REDIRECT_MARKER_REGEX.captures(line) {
            if !bib_files.is_empty() {
                exn::bail!(ErrorKind::DuplicateRedirectMarker);
            }
            bib_files = split_file_list(&captures[1]);
            redirected = true;
            continue;
        }
        if let Some(captures) = consts::BIBDATA_REGEX.captures(line) {
            if redirected {
                continue;
            }
            if !bib_files.is_empty() {
                exn::bail!(ErrorKind::DuplicateBibData);
            }
            bib_files = split_file_list(&captures[1]);
        }
    }
    Ok(AuxData { bib_files, citations })
}

fn split_file_list(list: &str) -> Vec<PathBuf> {
    list.split(',').map(canonical_bib_name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_citations_and_bibdata() {
        let aux = "\\relax\n\\citation{X1}\n\\citation{X2}\n\\bibstyle{plain}\n\\bibdata{refs,extra.bib}\n";
        let data = parse_contents(aux).unwrap();
        assert_eq!(data.citations, vec!["X1", "X2"]);
        assert_eq!(data.bib_files, vec![PathBuf::from("refs.bib"), PathBuf::from("extra.bib")]);
    }

    #[test]
    fn test_duplicate_citations_are_preserved_in_order() {
        let aux = "\\citation{B}\n\\citation{A}\n\\citation{B}\n\\bibdata{refs}\n";
        let data = parse_contents(aux).unwrap();
        assert_eq!(data.citations, vec!["B", "A", "B"]);
    }

    #[rstest]
    #[case("refs", "refs.bib")]
    #[case("refs.bib", "refs.bib")]
    #[case("  padded ", "padded.bib")]
    #[case("dir/refs", "dir/refs.bib")]
    fn test_canonical_bib_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(canonical_bib_name(name), PathBuf::from(expected));
    }

    #[test]
    fn test_marker_wins_over_bibdata() {
        let aux = "%\\bibcachedata{refs,extra}\n\\bibdata{paper.bibcache}\n\\citation{X1}\n";
        let data = parse_contents(aux).unwrap();
        assert_eq!(data.bib_files, vec![PathBuf::from("refs.bib"), PathBuf::from("extra.bib")]);
    }

    #[test]
    fn test_double_bibdata_is_an_error() {
        let aux = "\\bibdata{a}\n\\bibdata{b}\n";
        let error = parse_contents(aux).unwrap_err();
        assert!(matches!(*error, ErrorKind::DuplicateBibData));
    }

    #[test]
    fn test_marker_after_bibdata_is_an_error() {
        let aux = "\\bibdata{a}\n%\\bibcachedata{b}\n";
        let error = parse_contents(aux).unwrap_err();
        assert!(matches!(*error, ErrorKind::DuplicateRedirectMarker));
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        let aux = "\\relax\n\\@writefile{toc}{...}\n\\newlabel{sec:intro}{{1}{1}}\n";
        let data = parse_contents(aux).unwrap();
        assert!(data.bib_files.is_empty());
        assert!(data.citations.is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let error = parse(Path::new("definitely/not/here.aux")).unwrap_err();
        assert!(matches!(*error, ErrorKind::Read(_)));
    }
}
