use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::pipeline::DatasetEntry;

/// Convenience result type for reading tabular sources.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for table store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type returned when reading a tabular source into a [`crate::types::DataSet`].
///
/// This is a single error enum shared across CSV/JSON/Parquet readers.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. permission denied, file vanished mid-read).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse error (malformed quoting, ragged rows, invalid UTF-8).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parse error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parquet read error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// The input cannot be interpreted as a table (no header row, non-object JSON rows, unknown
    /// format, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },
}

/// Error type returned by [`crate::store::TableStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error (connection, constraint, DDL/DML failure).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A table needs at least one column.
    #[error("cannot create table '{table}' without columns")]
    EmptySchema { table: String },

    /// Batches must hold at least one row.
    #[error("batch size must be > 0")]
    InvalidBatchSize,
}

/// Underlying cause of a [`LoadError::LoadFailure`].
#[derive(Debug, Error)]
pub enum LoadCause {
    /// The source could not be parsed as tabular data.
    #[error(transparent)]
    Read(#[from] IngestionError),

    /// The parsed data could not be written to the store.
    #[error(transparent)]
    Write(#[from] StoreError),
}

/// Failure of a single dataset load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The configured source does not exist. Raised before the store is touched.
    #[error("source not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    /// The target table name cannot be used. Raised before the source or store is touched.
    #[error("invalid table name '{table}': {reason}")]
    InvalidTable { table: String, reason: &'static str },

    /// Parsing or writing failed; the target table keeps its previous contents.
    #[error("failed to load table '{table}': {cause}")]
    LoadFailure {
        table: String,
        #[source]
        cause: LoadCause,
    },
}

/// The first entry-level failure of an ingestion run.
#[derive(Debug, Error)]
#[error("ingestion failed at entry {} ({} -> '{}'): {cause}", .index + 1, .entry.source.display(), .entry.table)]
pub struct RunFailure {
    /// Zero-based position of the failing entry in the plan.
    pub index: usize,
    /// The failing entry.
    pub entry: DatasetEntry,
    /// Why it failed.
    #[source]
    pub cause: LoadError,
}

/// Failure of the downstream transformation stage.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The transformation process could not be started.
    #[error("failed to start transform '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The transformation process exited unsuccessfully.
    #[error("transform '{program}' exited with {status}")]
    Failed { program: String, status: ExitStatus },
}

/// Outcome of a gated two-stage run that did not complete.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Stage 1 failed; the transformation was not invoked.
    #[error(transparent)]
    Ingest(#[from] RunFailure),

    /// Stage 1 succeeded but the transformation failed.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl PipelineError {
    /// Process exit code reported to the invoking scheduler.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Ingest(_) => 1,
            Self::Transform(_) => 2,
        }
    }
}

/// Configuration/plan errors, detected before any dataset is loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Layered configuration could not be extracted.
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// Two entries target the same table within one run.
    #[error("table '{table}' is targeted by both {} and {}", .first.display(), .second.display())]
    DuplicateTable {
        table: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A table name the store cannot accept.
    #[error("invalid table name '{table}': {reason}")]
    InvalidTableName { table: String, reason: &'static str },

    /// The plan has nothing to load.
    #[error("no datasets configured")]
    NoEntries,
}
