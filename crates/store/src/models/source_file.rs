use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use std::path::PathBuf;

/// One recorded source file: ordinal position, path, and modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Position in the configured file list. For any one cache the recorded
    /// positions are exactly `0..N-1`, in order, with no gaps.
    pub seq: u32,
    pub path: PathBuf,
    /// Modification time in Unix nanoseconds.
    pub mtime: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct SourceFileRow {
    pub(crate) seq: i64,
    pub(crate) path: String,
    pub(crate) mtime: i64,
}

impl TryFrom<&SourceFile> for SourceFileRow {
    type Error = Error;
    fn try_from(file: &SourceFile) -> Result<Self, Self::Error> {
        Ok(Self {
            seq: i64::from(file.seq),
            path: file.path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string(),
            mtime: file.mtime,
        })
    }
}

impl TryFrom<SourceFileRow> for SourceFile {
    type Error = Error;
    fn try_from(row: SourceFileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            seq: u32::try_from(row.seq).or_raise(|| ErrorKind::InvalidData("file index"))?,
            path: PathBuf::from(row.path),
            mtime: row.mtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_model() {
        let row = SourceFileRow {
            seq: 2,
            path: "chapters/references.bib".to_string(),
            mtime: 1_771_177_811_000_000_000,
        };
        let model = SourceFile::try_from(row).unwrap();
        assert_eq!(model.seq, 2);
        assert_eq!(model.path, PathBuf::from("chapters/references.bib"));
    }

    #[test]
    fn test_model_to_row() {
        let model = SourceFile {
            seq: 0,
            path: PathBuf::from("references.bib"),
            mtime: 1_771_177_811_000_000_000,
        };
        let row = SourceFileRow::try_from(&model).unwrap();
        assert_eq!(row.seq, 0);
        assert_eq!(row.path, "references.bib");
        assert_eq!(row.mtime, model.mtime);
    }

    #[test]
    fn test_negative_index_is_rejected() {
        let row = SourceFileRow { seq: -1, path: "a.bib".to_string(), mtime: 0 };
        assert!(SourceFile::try_from(row).is_err());
    }
}
