//! Redirects an aux log's `\bibdata` at a generated bibliography.

use exn::ResultExt;
use std::io::Write;
use std::path::Path;
use tracing::instrument;

use crate::consts;
use crate::error::{ErrorKind, Result};

/// Point the aux log's `\bibdata` at `bibdata` (a name without the `.bib`
/// extension), keeping the original file list behind a `%\bibcachedata`
/// marker so later runs can still recover it.
///
/// All lines are read, transformed, written to a temporary file next to the
/// original, and renamed into place in one step - the aux log is never left
/// half rewritten. Redirecting an already-redirected log only refreshes the
/// `\bibdata` line; the marker is not duplicated.
#[instrument(skip(bibdata))]
pub fn redirect(path: &Path, bibdata: &str) -> Result<()> {
    let contents = std::fs::read_to_string(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let rewritten = redirect_contents(&contents, bibdata);
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(parent).or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    temp.write_all(rewritten.as_bytes()).or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    temp.persist(path).or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    Ok(())
}

fn redirect_contents(contents: &str, bibdata: &str) -> String {
    let mut out = String::with_capacity(contents.len());
    let mut redirected = false;
    for line in contents.lines() {
        if consts::REDIRECT_MARKER_REGEX.is_match(line) {
            redirected = true;
        }
        if consts::BIBDATA_REGEX.is_match(line) {
            if !redirected {
                out.push_str(&line.replacen("\\bibdata", "%\\bibcachedata", 1));
                out.push('\n');
            }
            out.push_str("\\bibdata{");
            out.push_str(bibdata);
            out.push_str("}\n");
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const AUX: &str = "\\relax\n\\citation{X1}\n\\bibdata{refs,extra}\n";

    #[test]
    fn test_redirect_replaces_bibdata_and_keeps_original() {
        assert_eq!(
            redirect_contents(AUX, "paper.bibcache"),
            "\\relax\n\\citation{X1}\n%\\bibcachedata{refs,extra}\n\\bibdata{paper.bibcache}\n"
        );
    }

    #[test]
    fn test_redirect_is_idempotent() {
        let once = redirect_contents(AUX, "paper.bibcache");
        let twice = redirect_contents(&once, "paper.bibcache");
        assert_eq!(once, twice);
        // Only one marker line survives repeated redirects.
        assert_eq!(twice.matches("%\\bibcachedata").count(), 1);
    }

    #[test]
    fn test_redirect_rewrites_the_file_in_place() {
        let dir = TempDir::new().unwrap();
        let aux = dir.path().join("paper.aux");
        std::fs::write(&aux, AUX).unwrap();
        redirect(&aux, "paper.bibcache").unwrap();
        let rewritten = std::fs::read_to_string(&aux).unwrap();
        assert!(rewritten.contains("\\bibdata{paper.bibcache}"));
        assert!(rewritten.contains("%\\bibcachedata{refs,extra}"));
    }

    #[test]
    fn test_parse_after_redirect_recovers_the_original_list() {
        let dir = TempDir::new().unwrap();
        let aux = dir.path().join("paper.aux");
        std::fs::write(&aux, AUX).unwrap();
        redirect(&aux, "paper.bibcache").unwrap();
        let data = parse(&aux).unwrap();
        // The marker wins: staleness keeps being checked against the real
        // sources, not the generated file.
        assert_eq!(data.bib_files, vec![PathBuf::from("refs.bib"), PathBuf::from("extra.bib")]);
        assert_eq!(data.citations, vec!["X1"]);
    }

    #[test]
    fn test_redirect_missing_file_is_an_error() {
        let error = redirect(Path::new("definitely/not/here.aux"), "x").unwrap_err();
        assert!(matches!(*error, ErrorKind::Read(_)));
    }
}
