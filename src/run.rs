//! Driver orchestration: aux log in, generated bibliography out.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use bibcache_auxlog::AuxData;
use bibcache_bibtex::{Parser, Writer};
use bibcache_config::Config;
use bibcache_store::{Database, Repository};
use exn::{OptionExt, ResultExt};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// What one run did.
#[derive(Debug)]
pub struct Outcome {
    /// Whether the cache had to be rebuilt.
    pub rebuilt: bool,
    /// Number of entries written to the generated bibliography.
    pub emitted: usize,
    /// Cited keys with no entry in any source file, in citation order.
    pub missing: Vec<String>,
    /// The generated bibliography file.
    pub output: PathBuf,
}

/// Process one document.
///
/// Parses its aux log, brings the cache up to date, emits the cited entries
/// into `<stem>.bibcache.bib`, and redirects the aux log at that file. The
/// cache handle is opened once here and released before returning, on the
/// failure path too.
#[instrument(skip(config))]
pub async fn run(aux_path: &Path, config: &Config) -> Result<Outcome> {
    let aux = bibcache_auxlog::parse(aux_path).or_raise(|| ErrorKind::Aux)?;
    let bib_files = resolve_bib_files(aux_path, &aux);
    let db_path = config.cache.path.clone().unwrap_or_else(|| aux_path.with_extension("bibcache.db"));
    let db = Database::connect(&db_path).await.or_raise(|| ErrorKind::Cache)?;
    let outcome = process(aux_path, &aux, &bib_files, &db, config).await;
    // A failed rebuild has already rolled back by the time we get here; all
    // that is left to do is hand the file back.
    db.close().await;
    outcome
}

async fn process(
    aux_path: &Path,
    aux: &AuxData,
    bib_files: &[PathBuf],
    db: &Database,
    config: &Config,
) -> Result<Outcome> {
    let repo = Repository::from(db);
    let mut parser = Parser::new().without_person_parsing();
    let writer = if config.serializer.trusted { Writer::trusted() } else { Writer::strict() };
    let rebuilt = repo.update(bib_files, &mut parser, &writer).await.or_raise(|| ErrorKind::Cache)?;
    let found = repo.lookup(&aux.citations).await.or_raise(|| ErrorKind::Cache)?;
    let by_key: HashMap<&str, &str> =
        found.iter().map(|entry| (entry.key.as_str(), entry.bibtex.as_str())).collect();
    // Emit in first-citation order, each key once. Reconciling cited keys
    // against what the store returned is the driver's job; the store only
    // reports what it has.
    let mut seen = HashSet::new();
    let mut contents = String::new();
    let mut missing = Vec::new();
    let mut emitted = 0usize;
    for key in &aux.citations {
        if !seen.insert(key.as_str()) {
            continue;
        }
        match by_key.get(key.as_str()) {
            Some(bibtex) => {
                contents.push_str(bibtex);
                contents.push('\n');
                emitted += 1;
            },
            None => {
                tracing::warn!(key = %key, "no database entry for citation");
                missing.push(key.clone());
            },
        }
    }
    let output = aux_path.with_extension("bibcache.bib");
    tokio::fs::write(&output, &contents).await.or_raise(|| ErrorKind::Output)?;
    let bibdata = output
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_raise(|| ErrorKind::Output)?;
    bibcache_auxlog::redirect(aux_path, &bibdata).or_raise(|| ErrorKind::Redirect)?;
    tracing::info!(rebuilt, emitted, missing = missing.len(), output = %output.display(), "document processed");
    Ok(Outcome { rebuilt, emitted, missing, output })
}

/// Bibliography paths in the aux log are relative to the document, not to
/// wherever this process happens to run.
fn resolve_bib_files(aux_path: &Path, aux: &AuxData) -> Vec<PathBuf> {
    let base = aux_path.parent().filter(|dir| !dir.as_os_str().is_empty());
    aux.bib_files
        .iter()
        .map(|file| match base {
            Some(base) if file.is_relative() => base.join(file),
            _ => file.clone(),
        })
        .collect()
}
