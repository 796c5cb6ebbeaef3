use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::LoadError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (bad data; the load failed).
    Error,
    /// Critical error (missing source, I/O or store failures).
    Critical,
}

/// Context about a single dataset load.
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// Source path.
    pub source: PathBuf,
    /// Target table.
    pub table: String,
}

/// Stats reported on a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStats {
    /// Target table.
    pub table: String,
    /// Rows written (header excluded).
    pub rows: usize,
    /// Columns written.
    pub columns: usize,
    /// Number of insert batches.
    pub batches: usize,
    /// Wall time for parse + write.
    pub elapsed: Duration,
}

/// Observer interface for load outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts. Observers only narrate: they cannot
/// change the outcome of a load.
pub trait LoadObserver: Send + Sync {
    /// Called before the source is checked.
    fn on_start(&self, _ctx: &LoadContext) {}

    /// Called when a load succeeds.
    fn on_success(&self, _ctx: &LoadContext, _stats: &LoadStats) {}

    /// Called when a load fails.
    fn on_failure(&self, _ctx: &LoadContext, _severity: LoadSeverity, _error: &LoadError) {}

    /// Called when a load failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn LoadObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn LoadObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl LoadObserver for CompositeObserver {
    fn on_start(&self, ctx: &LoadContext) {
        for o in &self.observers {
            o.on_start(ctx);
        }
    }

    fn on_success(&self, ctx: &LoadContext, stats: &LoadStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Narrates load events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn on_start(&self, ctx: &LoadContext) {
        tracing::info!(table = %ctx.table, source = %ctx.source.display(), "loading '{}'", ctx.table);
    }

    fn on_success(&self, _ctx: &LoadContext, stats: &LoadStats) {
        tracing::info!(
            table = %stats.table,
            rows = stats.rows,
            columns = stats.columns,
            batches = stats.batches,
            elapsed = ?stats.elapsed,
            "{} rows loaded into '{}'",
            stats.rows,
            stats.table
        );
    }

    fn on_failure(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        tracing::error!(table = %ctx.table, source = %ctx.source.display(), ?severity, "{error}");
    }

    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        tracing::error!(alert = true, table = %ctx.table, source = %ctx.source.display(), ?severity, "{error}");
    }
}

/// Appends load events to a local narration log.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl LoadObserver for FileObserver {
    fn on_start(&self, ctx: &LoadContext) {
        self.append_line(&format!(
            "{} start table={} source={}",
            unix_ts(),
            ctx.table,
            ctx.source.display()
        ));
    }

    fn on_success(&self, ctx: &LoadContext, stats: &LoadStats) {
        self.append_line(&format!(
            "{} ok table={} source={} rows={} batches={}",
            unix_ts(),
            stats.table,
            ctx.source.display(),
            stats.rows,
            stats.batches
        ));
    }

    fn on_failure(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        self.append_line(&format!(
            "{} fail severity={:?} table={} source={} err={}",
            unix_ts(),
            severity,
            ctx.table,
            ctx.source.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &LoadContext, severity: LoadSeverity, error: &LoadError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} table={} source={} err={}",
            unix_ts(),
            severity,
            ctx.table,
            ctx.source.display(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
