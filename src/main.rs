use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use bibcache_config::Config;

/// Cached BibTeX processing for LaTeX document builds.
#[derive(Parser, Debug)]
#[command(name = "bibcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The .aux file produced by the LaTeX run
    aux: PathBuf,

    /// Path to a bibcache.toml configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the cache database location
    #[arg(long, value_name = "FILE")]
    cache: Option<PathBuf>,

    /// Re-validate brace balance when serializing entries
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(error = ?error, "could not load configuration");
            return ExitCode::FAILURE;
        },
    };
    if let Some(cache) = cli.cache {
        config.cache.path = Some(cache);
    }
    if cli.strict {
        config.serializer.trusted = false;
    }
    match bibcache::run(&cli.aux, &config).await {
        Ok(outcome) => {
            tracing::info!(
                rebuilt = outcome.rebuilt,
                emitted = outcome.emitted,
                missing = outcome.missing.len(),
                output = %outcome.output.display(),
                "done"
            );
            ExitCode::SUCCESS
        },
        Err(error) => {
            tracing::error!(error = ?error, "bibcache failed");
            ExitCode::FAILURE
        },
    }
}
