//! genrec: genetics recommendation report generator.
//! Entry point for the command-line binary.

mod config;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use genrec_common::form::GeneratorForm;
use genrec_db::{fetch_all, MemoryStore, RecommendationStore};
use genrec_engine::{audit_snapshot, GenerateError, ReportGenerator};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, OutputFormat, StoreBackend};

#[derive(Parser, Debug)]
#[command(name = "genrec", version, about = "Genetics recommendation report generator")]
struct Cli {
    /// Path to genrec.toml
    #[arg(long, global = true, env = "GENREC_CONFIG")]
    config: Option<PathBuf>,

    /// Override the store backend from the config file
    #[arg(long, global = true, value_enum)]
    backend: Option<StoreBackend>,

    /// Override the fixture file from the config file
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Override the output format from the config file
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a report from a generator form (YAML or JSON)
    Generate {
        form: PathBuf,
    },
    /// Show how one mutation resolves against every group of its gene
    Explain {
        #[arg(long)]
        gene: String,
        #[arg(long)]
        mutation: String,
    },
    /// Report row counts and consistency problems in the store
    Check,
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn RecommendationStore>> {
    match config.store.backend {
        StoreBackend::Fixture => {
            let path = &config.store.fixture_path;
            let store = MemoryStore::open_fixture(path)
                .with_context(|| format!("loading fixture {}", path.display()))?;
            info!(path = %path.display(), "Using fixture store");
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => {
            let url = config
                .store
                .url
                .as_deref()
                .context("store.url is required for the postgres backend")?;
            Ok(Arc::new(genrec_db::PgStore::connect(url).await?))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres => {
            anyhow::bail!("this build has no PostgreSQL support (rebuild with --features postgres)")
        }
    }
}

fn emit<T: Serialize>(
    config: &Config,
    value: &T,
    text: impl FnOnce(&T) -> Result<String, std::fmt::Error>,
) -> anyhow::Result<()> {
    let out = match config.output.format {
        OutputFormat::Text => text(value)?,
        OutputFormat::Json if config.output.pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Json => serde_json::to_string(value)?,
    };
    println!("{}", out.trim_end());
    Ok(())
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    counts: Vec<(&'static str, usize)>,
    findings: &'a [genrec_engine::Finding],
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("genrec=info,warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }
    if let Some(fixture) = cli.fixture {
        config.store.fixture_path = fixture;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    let store = open_store(&config).await?;

    match cli.command {
        Command::Generate { form } => {
            let form = GeneratorForm::load(&form).with_context(|| format!("reading form {}", form.display()))?;
            let generator = ReportGenerator::new(store);
            match generator.generate(&form).await {
                Ok(report) => emit(&config, &report, render::report)?,
                Err(GenerateError::Invalid(errors)) => {
                    for e in &errors.errors {
                        eprintln!("{}: {}", e.field, e.message);
                    }
                    anyhow::bail!("form rejected with {} error(s)", errors.errors.len());
                }
                Err(e) => return Err(e).context("report generation failed"),
            }
        }
        Command::Explain { gene, mutation } => {
            let generator = ReportGenerator::new(store);
            let explanation = generator.explain(&gene, &mutation).await?;
            emit(&config, &explanation, render::explanation)?;
        }
        Command::Check => {
            let snapshot = fetch_all(store.as_ref()).await.context("reading store")?;
            let findings = audit_snapshot(&snapshot);
            let counts = genrec_db::schema::table_counts(&snapshot);
            info!(rows = snapshot.row_count(), findings = findings.len(), "Store checked");
            let output = CheckOutput { counts, findings: &findings };
            emit(&config, &output, |o| render::check(&o.counts, o.findings))?;
            if !findings.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
