//! Ordered, fail-fast ingestion of a fixed entry set.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RunFailure};
use crate::ingestion::{LoadObserver, LoadSeverity, LoadStats};
use crate::store::{validate_table_name, TableStore, WriteOptions};

use super::{DatasetEntry, DatasetLoader};

/// Everything a run needs besides the store handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionPlan {
    /// Entries, loaded in this order.
    pub entries: Vec<DatasetEntry>,
    /// Write options shared by every entry.
    #[serde(default)]
    pub write: WriteOptions,
}

/// Outcome of a run in which every entry loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Per-entry stats, in load order.
    pub loaded: Vec<LoadStats>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl RunReport {
    /// Total rows written across all tables.
    pub fn total_rows(&self) -> usize {
        self.loaded.iter().map(|s| s.rows).sum()
    }
}

/// Runs the [`DatasetLoader`] over a validated entry list, stopping at the first failure.
#[derive(Debug, Clone)]
pub struct IngestionCoordinator {
    entries: Vec<DatasetEntry>,
    loader: DatasetLoader,
}

impl IngestionCoordinator {
    /// Validate `plan` and build a coordinator.
    ///
    /// Rejects empty plans, table names the store cannot accept, and two entries targeting the
    /// same table (compared case-insensitively, as SQL identifiers are).
    pub fn new(plan: IngestionPlan) -> Result<Self, ConfigError> {
        validate_entries(&plan.entries)?;
        Ok(Self {
            entries: plan.entries,
            loader: DatasetLoader::new(plan.write),
        })
    }

    /// Attach an observer for per-entry narration.
    pub fn with_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.loader = self.loader.with_observer(observer);
        self
    }

    /// Severity threshold at which observers are alerted.
    pub fn with_alert_threshold(mut self, severity: LoadSeverity) -> Self {
        self.loader = self.loader.with_alert_threshold(severity);
        self
    }

    /// Entries in load order.
    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    /// Load every entry in declared order.
    ///
    /// Stops at the first failing entry; later entries are not attempted. Tables replaced
    /// earlier in a failed run stay replaced: there is no cross-table transaction.
    pub fn run_all<S: TableStore + ?Sized>(&self, store: &mut S) -> Result<RunReport, RunFailure> {
        let start = Instant::now();
        tracing::info!(entries = self.entries.len(), "starting ingestion");

        let mut loaded = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            match self.loader.load(entry, store) {
                Ok(stats) => loaded.push(stats),
                Err(cause) => {
                    let skipped = self.entries.len() - index - 1;
                    tracing::error!(index, table = %entry.table, skipped, "ingestion stopped");
                    return Err(RunFailure {
                        index,
                        entry: entry.clone(),
                        cause,
                    });
                }
            }
        }

        let report = RunReport {
            loaded,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            tables = report.loaded.len(),
            rows = report.total_rows(),
            elapsed = ?report.elapsed,
            "all data ingested successfully"
        );
        Ok(report)
    }
}

fn validate_entries(entries: &[DatasetEntry]) -> Result<(), ConfigError> {
    if entries.is_empty() {
        return Err(ConfigError::NoEntries);
    }

    let mut seen: HashMap<String, &Path> = HashMap::new();
    for entry in entries {
        validate_table_name(&entry.table).map_err(|reason| ConfigError::InvalidTableName {
            table: entry.table.clone(),
            reason,
        })?;

        if let Some(first) = seen.insert(entry.table.to_ascii_lowercase(), &entry.source) {
            return Err(ConfigError::DuplicateTable {
                table: entry.table.clone(),
                first: first.to_path_buf(),
                second: entry.source.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(entries: Vec<DatasetEntry>) -> IngestionPlan {
        IngestionPlan {
            entries,
            write: WriteOptions::default(),
        }
    }

    #[test]
    fn empty_plan_is_rejected() {
        assert!(matches!(
            IngestionCoordinator::new(plan(Vec::new())),
            Err(ConfigError::NoEntries)
        ));
    }

    #[test]
    fn duplicate_tables_are_rejected_case_insensitively() {
        let err = IngestionCoordinator::new(plan(vec![
            DatasetEntry::new("a.csv", "orders"),
            DatasetEntry::new("b.csv", "sellers"),
            DatasetEntry::new("c.csv", "Orders"),
        ]))
        .unwrap_err();

        match err {
            ConfigError::DuplicateTable { table, first, second } => {
                assert_eq!(table, "Orders");
                assert_eq!(first, Path::new("a.csv"));
                assert_eq!(second, Path::new("c.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reserved_table_names_are_rejected() {
        let err = IngestionCoordinator::new(plan(vec![DatasetEntry::new("a.csv", "sqlite_stat1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTableName { .. }));
    }

    #[test]
    fn entries_keep_declared_order() {
        let c = IngestionCoordinator::new(plan(vec![
            DatasetEntry::new("z.csv", "z"),
            DatasetEntry::new("a.csv", "a"),
        ]))
        .unwrap();
        let tables: Vec<&str> = c.entries().iter().map(|e| e.table.as_str()).collect();
        assert_eq!(tables, vec!["z", "a"]);
    }
}
