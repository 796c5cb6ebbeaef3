//! Per-dataset load routine.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{IngestionError, LoadCause, LoadError, StoreError};
use crate::ingestion::{read_table, LoadContext, LoadObserver, LoadSeverity, LoadStats, ReadOptions};
use crate::store::{validate_table_name, TableStore, WriteOptions};

use super::DatasetEntry;

/// Loads one source into one table with full-replace semantics.
///
/// The loader sees a single entry at a time and has no knowledge of the rest of the run.
#[derive(Clone)]
pub struct DatasetLoader {
    write: WriteOptions,
    observer: Option<Arc<dyn LoadObserver>>,
    alert_at_or_above: LoadSeverity,
}

impl fmt::Debug for DatasetLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetLoader")
            .field("write", &self.write)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(WriteOptions::default())
    }
}

impl DatasetLoader {
    /// Create a loader writing with `write` options and no observer.
    pub fn new(write: WriteOptions) -> Self {
        Self {
            write,
            observer: None,
            alert_at_or_above: LoadSeverity::Critical,
        }
    }

    /// Attach an observer for narration/alerts.
    pub fn with_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Severity threshold at which `on_alert` is invoked.
    pub fn with_alert_threshold(mut self, severity: LoadSeverity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    /// Write options used for every load.
    pub fn write_options(&self) -> &WriteOptions {
        &self.write
    }

    /// Load `entry.source` into `entry.table`, replacing the table.
    ///
    /// The table name and the source's existence are checked before anything else; an unusable
    /// name is [`LoadError::InvalidTable`], a missing source is [`LoadError::SourceNotFound`],
    /// and in both cases the store is not touched. Any parse or write error is
    /// reported as [`LoadError::LoadFailure`] and the table keeps its previous contents.
    ///
    /// When an observer is configured, this function reports:
    ///
    /// - `on_start` before the existence check
    /// - `on_success` on success, with row/batch stats
    /// - `on_failure` on failure, with a computed severity
    /// - `on_alert` on failure when the computed severity is >= the alert threshold
    pub fn load<S: TableStore + ?Sized>(&self, entry: &DatasetEntry, store: &mut S) -> Result<LoadStats, LoadError> {
        let ctx = LoadContext {
            source: entry.source.clone(),
            table: entry.table.clone(),
        };
        if let Some(obs) = self.observer.as_ref() {
            obs.on_start(&ctx);
        }

        let result = self.load_inner(entry, store);

        if let Some(obs) = self.observer.as_ref() {
            match &result {
                Ok(stats) => obs.on_success(&ctx, stats),
                Err(e) => {
                    let sev = severity_for_error(e);
                    obs.on_failure(&ctx, sev, e);
                    if sev >= self.alert_at_or_above {
                        obs.on_alert(&ctx, sev, e);
                    }
                }
            }
        }

        result
    }

    fn load_inner<S: TableStore + ?Sized>(&self, entry: &DatasetEntry, store: &mut S) -> Result<LoadStats, LoadError> {
        let start = Instant::now();

        validate_table_name(&entry.table).map_err(|reason| LoadError::InvalidTable {
            table: entry.table.clone(),
            reason,
        })?;

        if entry.source_missing() {
            return Err(LoadError::SourceNotFound {
                path: entry.source.clone(),
            });
        }

        let failure = |cause: LoadCause| LoadError::LoadFailure {
            table: entry.table.clone(),
            cause,
        };

        let data = read_table(&entry.source, &ReadOptions { format: entry.format })
            .map_err(|e| failure(e.into()))?;
        tracing::debug!(table = %entry.table, rows = data.row_count(), columns = data.column_count(), "parsed source");

        let written = store
            .replace_table(&entry.table, &data, &self.write)
            .map_err(|e| failure(e.into()))?;

        Ok(LoadStats {
            table: entry.table.clone(),
            rows: written.rows,
            columns: data.column_count(),
            batches: written.batches,
            elapsed: start.elapsed(),
        })
    }
}

/// Classify a load failure for observers.
///
/// Missing sources, I/O and store failures are infrastructure problems (`Critical`); bad data
/// is `Error`.
pub fn severity_for_error(e: &LoadError) -> LoadSeverity {
    match e {
        LoadError::SourceNotFound { .. } => LoadSeverity::Critical,
        LoadError::InvalidTable { .. } => LoadSeverity::Error,
        LoadError::LoadFailure { cause, .. } => match cause {
            LoadCause::Read(IngestionError::Io(_)) => LoadSeverity::Critical,
            LoadCause::Read(IngestionError::Csv(err)) => match err.kind() {
                ::csv::ErrorKind::Io(_) => LoadSeverity::Critical,
                _ => LoadSeverity::Error,
            },
            LoadCause::Read(IngestionError::Json(err)) if err.is_io() => LoadSeverity::Critical,
            LoadCause::Read(IngestionError::Parquet(err)) => {
                // Parquet errors sometimes wrap IO without a structured variant.
                if error_chain_contains_io(err) {
                    LoadSeverity::Critical
                } else {
                    LoadSeverity::Error
                }
            }
            LoadCause::Read(_) => LoadSeverity::Error,
            LoadCause::Write(StoreError::Sqlite(_)) => LoadSeverity::Critical,
            LoadCause::Write(_) => LoadSeverity::Error,
        },
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
