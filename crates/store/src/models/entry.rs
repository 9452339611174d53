/// One cached entry: citation key and its ready-to-emit BibTeX text.
///
/// The cache never reinterprets `bibtex`; it is stored and returned verbatim.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CachedEntry {
    /// Citation key, unique and case-sensitive.
    pub key: String,
    /// Serialized entry text.
    pub bibtex: String,
}
