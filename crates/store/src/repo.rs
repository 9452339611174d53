//! Repository over the two cache tables: the recorded source-file list and
//! the entry mapping.
//!
//! The recorded list is compared element-wise against the caller's current
//! file list; any difference invalidates everything. A rebuild re-ingests
//! every source file in order inside one transaction, so observers only ever
//! see the old cache or the complete new one.

use std::collections::HashMap;
use std::path::PathBuf;

use bibcache_bibtex::{Entry, Parser, Writer};
use exn::ResultExt;
use sqlx::SqlitePool;
use tracing::instrument;

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::manifest;
use crate::models::{CachedEntry, SourceFile, SourceFileRow};

/// Repository for the cached source-file list and serialized entries.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Staleness oracle
    // =========================================================================

    /// Whether the cache was built from exactly `files` as they are right now.
    ///
    /// Compares the recorded `(seq, path, mtime)` triples element-wise and in
    /// order against a fresh stat of every path. Any difference - a file
    /// added, removed, renamed, reordered, or touched - reports stale.
    ///
    /// Read-only; a failed stat propagates instead of being folded into the
    /// answer.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn is_up_to_date(&self, files: &[PathBuf]) -> Result<bool> {
        let expected = manifest::current(files).await?;
        let recorded = self.source_files().await?;
        Ok(recorded == expected)
    }

    /// The recorded source-file list, in ordinal order.
    pub async fn source_files(&self) -> Result<Vec<SourceFile>> {
        let rows: Vec<SourceFileRow> = sqlx::query_as(include_str!("../queries/list_source_files.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(SourceFile::try_from).collect()
    }

    // =========================================================================
    // Rebuild
    // =========================================================================

    /// Rebuild the cache if it no longer matches `files`.
    ///
    /// Returns `true` if a rebuild happened.
    pub async fn update(&self, files: &[PathBuf], parser: &mut Parser, writer: &Writer) -> Result<bool> {
        if self.is_up_to_date(files).await? {
            tracing::info!("cache database up to date");
            return Ok(false);
        }
        tracing::info!("cache database out of date, rebuilding");
        self.rebuild(files, parser, writer).await?;
        Ok(true)
    }

    /// Wholesale rebuild: drop all recorded state and re-ingest every source
    /// file in input order.
    ///
    /// All files are parsed before anything is serialized, and all writes
    /// happen in a single transaction, so a failure at any point leaves the
    /// previously committed cache untouched.
    ///
    /// # Errors
    ///
    /// An unreadable file, malformed BibTeX, or the same citation key defined
    /// in two files fails the whole rebuild.
    #[instrument(skip(self, files, parser, writer), fields(count = files.len()))]
    pub async fn rebuild(&self, files: &[PathBuf], parser: &mut Parser, writer: &Writer) -> Result<()> {
        let manifest = manifest::current(files).await?;
        let mut parsed: Vec<Entry> = Vec::new();
        let mut origins: HashMap<String, PathBuf> = HashMap::new();
        for source in &manifest {
            let raw = tokio::fs::read_to_string(&source.path)
                .await
                .or_raise(|| ErrorKind::Read(source.path.clone()))?;
            let bibliography = parser.parse(&raw).or_raise(|| ErrorKind::Parse(source.path.clone()))?;
            for entry in bibliography.entries {
                if let Some(first) = origins.insert(entry.key.clone(), source.path.clone()) {
                    exn::bail!(ErrorKind::DuplicateKey {
                        key: entry.key,
                        first,
                        second: source.path.clone(),
                    });
                }
                parsed.push(entry);
            }
        }
        let mut serialized = Vec::with_capacity(parsed.len());
        for entry in &parsed {
            let bibtex = writer.entry_to_string(entry).or_raise(|| ErrorKind::Serialize(entry.key.clone()))?;
            serialized.push((entry.key.as_str(), bibtex));
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/clear_source_files.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/clear_entries.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for source in &manifest {
            let row = SourceFileRow::try_from(source)?;
            sqlx::query(include_str!("../queries/insert_source_file.sql"))
                .bind(row.seq)
                .bind(row.path)
                .bind(row.mtime)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for (key, bibtex) in &serialized {
            sqlx::query(include_str!("../queries/insert_entry.sql"))
                .bind(key)
                .bind(bibtex)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::info!(files = manifest.len(), entries = serialized.len(), "cache database rebuilt");
        Ok(())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Exact-key lookup of serialized entries.
    ///
    /// Returns one pair per requested key that exists; absent keys are
    /// omitted, not errors - the caller reconciles against its own expected
    /// list. No ordering guarantee on the result. Only meaningful after
    /// [`is_up_to_date`](Self::is_up_to_date) reported true; this is not
    /// re-checked here.
    #[instrument(skip(self, keys), fields(requested = keys.len()))]
    pub async fn lookup(&self, keys: &[String]) -> Result<Vec<CachedEntry>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!("SELECT key, bibtex FROM entries WHERE key IN ({placeholders})");
        let mut query = sqlx::query_as::<_, CachedEntry>(&sql);
        for key in keys {
            query = query.bind(key);
        }
        query.fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)
    }

    /// Number of cached entries.
    pub async fn count_entries(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_entries.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("entry count"))
    }
}
