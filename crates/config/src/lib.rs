//! Configuration loading for bibcache.
//!
//! Configuration merges three layers, later ones winning: built-in defaults,
//! an optional TOML file, and `BIBCACHE_`-prefixed environment variables
//! (nested keys split on `__`, e.g. `BIBCACHE_SERIALIZER__TRUSTED=false`).
//! When no file is named explicitly, the platform config directory is
//! checked for `bibcache.toml`; a missing file is fine, defaults apply.

pub mod error;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub serializer: SerializerConfig,
}

/// Where the cache database lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Explicit cache database path. When unset, the driver derives one from
    /// the document being processed.
    pub path: Option<PathBuf>,
}

/// How entries are serialized for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Skip brace-balance validation when serializing parsed entries.
    ///
    /// The default trusts the parser's output. Turn this off when ingesting
    /// bibliography files of unknown provenance.
    pub trusted: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self { trusted: true }
    }
}

impl Config {
    /// Load configuration, optionally from an explicit file.
    ///
    /// With `explicit` set, that file must exist and parse. Without it, the
    /// platform config directory is consulted and silently skipped when the
    /// file is absent.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match explicit {
            Some(path) => figment = figment.merge(Toml::file_exact(path)),
            None => {
                if let Some(dirs) = ProjectDirs::from("", "", "bibcache") {
                    figment = figment.merge(Toml::file(dirs.config_dir().join("bibcache.toml")));
                }
            },
        }
        figment.merge(Env::prefixed("BIBCACHE_").split("__")).extract().or_raise(|| ErrorKind::Extract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.path, None);
        assert!(config.serializer.trusted);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "bibcache.toml",
                r#"
                    [cache]
                    path = "shared/cache.db"

                    [serializer]
                    trusted = false
                "#,
            )?;
            let config = Config::load(Some(Path::new("bibcache.toml"))).unwrap();
            assert_eq!(config.cache.path, Some(PathBuf::from("shared/cache.db")));
            assert!(!config.serializer.trusted);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "bibcache.toml",
                r#"
                    [serializer]
                    trusted = true
                "#,
            )?;
            jail.set_env("BIBCACHE_SERIALIZER__TRUSTED", "false");
            let config = Config::load(Some(Path::new("bibcache.toml"))).unwrap();
            assert!(!config.serializer.trusted);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("definitely/not/here.toml")));
        assert!(result.is_err());
    }
}
