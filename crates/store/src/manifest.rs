//! Builds the expected source-file manifest from the filesystem.

use exn::ResultExt;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::SourceFile;

/// Stat every path, in input order, into the manifest the recorded list is
/// compared against.
///
/// Fails on the first path that cannot be stat'ed. A missing source file is
/// an error to surface, never a silent "stale" or "fresh".
#[instrument(skip(files), fields(count = files.len()))]
pub(crate) async fn current(files: &[PathBuf]) -> Result<Vec<SourceFile>> {
    let mut manifest = Vec::with_capacity(files.len());
    for (seq, path) in files.iter().enumerate() {
        let metadata = tokio::fs::metadata(path).await.or_raise(|| ErrorKind::Stat(path.clone()))?;
        let modified = metadata.modified().or_raise(|| ErrorKind::Stat(path.clone()))?;
        let mtime = i64::try_from(OffsetDateTime::from(modified).unix_timestamp_nanos())
            .or_raise(|| ErrorKind::InvalidData("modification time"))?;
        let seq = u32::try_from(seq).or_raise(|| ErrorKind::InvalidData("file index"))?;
        manifest.push(SourceFile { seq, path: path.clone(), mtime });
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_manifest_preserves_input_order() {
        let dir = TempDir::new().unwrap();
        let zebra = dir.path().join("zebra.bib");
        let apple = dir.path().join("apple.bib");
        std::fs::write(&zebra, "@misc{z, note = {z}}").unwrap();
        std::fs::write(&apple, "@misc{a, note = {a}}").unwrap();
        // Deliberately not in lexicographic order; position is what counts.
        let manifest = current(&[zebra.clone(), apple.clone()]).await.unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!((manifest[0].seq, &manifest[0].path), (0, &zebra));
        assert_eq!((manifest[1].seq, &manifest[1].path), (1, &apple));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.bib");
        let error = current(&[missing]).await.unwrap_err();
        assert!(matches!(*error, ErrorKind::Stat(_)));
    }
}
