use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use supply_chain_ingest::config::PipelineConfig;
use supply_chain_ingest::ingestion::{CompositeObserver, FileObserver, LoadObserver, TracingObserver};
use supply_chain_ingest::pipeline::{run_gated, IngestionCoordinator, TransformStage};
use supply_chain_ingest::store::SqliteStore;
use supply_chain_ingest::PipelineError;

const EXIT_CONFIG: u8 = 3;

/// Load the supply-chain datasets into SQLite and run the SQL transformation on top.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file.
    #[arg(short, long, env = "PIPELINE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides `store.path`).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Rows per insert batch (overrides `store.batch_size`).
    #[arg(long)]
    batch_size: Option<usize>,

    /// Directory relative dataset paths resolve against (overrides `ingest.base_dir`).
    #[arg(long)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Ingest all datasets, then transform if ingestion succeeded.
    Run,
    /// Stage 1 only: ingest all datasets.
    Ingest,
    /// Stage 2 only: run the transformation.
    Transform,
    /// Report which configured sources exist, without touching the store.
    Check,
}

fn setup_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.parse()?)
        .from_env_lossy();

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    if let Some(path) = &cli.config {
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }
    }

    let mut figment = PipelineConfig::figment(cli.config.as_deref());
    if let Some(db) = &cli.db {
        figment = figment.merge(("store.path", db));
    }
    if let Some(batch_size) = cli.batch_size {
        figment = figment.merge(("store.batch_size", batch_size));
    }
    if let Some(base_dir) = &cli.base_dir {
        figment = figment.merge(("ingest.base_dir", base_dir));
    }

    Ok(PipelineConfig::from_figment(figment)?)
}

fn observer(config: &PipelineConfig) -> Arc<dyn LoadObserver> {
    let tracing_observer: Arc<dyn LoadObserver> = Arc::new(TracingObserver);
    match &config.logging.narration_log {
        Some(path) => {
            let file_observer: Arc<dyn LoadObserver> = Arc::new(FileObserver::new(path));
            Arc::new(CompositeObserver::new(vec![tracing_observer, file_observer]))
        }
        None => tracing_observer,
    }
}

fn execute(command: Command, config: &PipelineConfig) -> Result<ExitCode> {
    let coordinator = IngestionCoordinator::new(config.plan())
        .context("invalid dataset configuration")?
        .with_observer(observer(config));

    match command {
        Command::Check => {
            let mut missing = 0usize;
            for entry in coordinator.entries() {
                if entry.source_missing() {
                    missing += 1;
                    tracing::warn!(table = %entry.table, source = %entry.source.display(), "missing");
                } else {
                    tracing::info!(table = %entry.table, source = %entry.source.display(), "found");
                }
            }
            if missing > 0 {
                tracing::error!(missing, "some sources are missing");
                return Ok(ExitCode::from(1));
            }
            tracing::info!("all sources present");
            Ok(ExitCode::SUCCESS)
        }
        Command::Transform => {
            let mut transform = config.transform.clone();
            match transform.run() {
                Ok(()) => Ok(ExitCode::SUCCESS),
                Err(e) => Ok(failed(&PipelineError::Transform(e))),
            }
        }
        Command::Ingest => {
            let mut store = open_store(config)?;
            match coordinator.run_all(&mut store) {
                Ok(_) => Ok(ExitCode::SUCCESS),
                Err(e) => Ok(failed(&PipelineError::Ingest(e))),
            }
        }
        Command::Run => {
            let mut store = open_store(config)?;
            let mut transform = config.transform.clone();
            match run_gated(&coordinator, &mut store, &mut transform) {
                Ok(report) => {
                    tracing::info!(
                        tables = report.ingest.loaded.len(),
                        rows = report.ingest.total_rows(),
                        transform = %report.transform,
                        "pipeline finished"
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(failed(&e)),
            }
        }
    }
}

fn open_store(config: &PipelineConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.store.path)
        .with_context(|| format!("cannot open database {}", config.store.path.display()))
}

fn failed(e: &PipelineError) -> ExitCode {
    tracing::error!("pipeline failed: {e}");
    ExitCode::from(e.exit_code())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    if let Err(e) = setup_tracing(&config.logging.level) {
        eprintln!("error: invalid logging.level '{}': {e:#}", config.logging.level);
        return ExitCode::from(EXIT_CONFIG);
    }
    tracing::debug!(?config, "Full pipeline configuration");

    match execute(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_CONFIG)
        }
    }
}
