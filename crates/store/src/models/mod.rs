mod entry;
mod source_file;

pub use self::entry::CachedEntry;
pub use self::source_file::SourceFile;
pub(crate) use self::source_file::SourceFileRow;
