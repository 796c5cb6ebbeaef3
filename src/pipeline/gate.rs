//! Two-stage ordering: the transformation runs only after ingestion reports success.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, TransformError};
use crate::store::TableStore;

use super::{IngestionCoordinator, RunReport};

/// A downstream stage that consumes the loaded tables.
pub trait TransformStage {
    /// Human-readable stage name, used in narration.
    fn name(&self) -> &str;

    /// Run the stage to completion.
    fn run(&mut self) -> Result<(), TransformError>;
}

impl<T: TransformStage + ?Sized> TransformStage for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&mut self) -> Result<(), TransformError> {
        (**self).run()
    }
}

/// Transformation implemented by an external program (e.g. `dbt run`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStage {
    /// Program to execute, looked up on `PATH` when not a path.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory; inherits the current one when `None`.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl CommandStage {
    /// A stage running `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    /// Append arguments.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir`.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl TransformStage for CommandStage {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&mut self) -> Result<(), TransformError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::info!(program = %self.program, args = ?self.args, working_dir = ?self.working_dir, "starting transform");
        let status = cmd.status().map_err(|source| TransformError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(TransformError::Failed {
                program: self.program.clone(),
                status,
            })
        }
    }
}

/// Outcome of a gated run in which both stages succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Stage 1 outcome.
    pub ingest: RunReport,
    /// Name of the transform that ran.
    pub transform: String,
    /// Wall time of the transform.
    pub transform_elapsed: Duration,
}

/// Run ingestion, then the transformation if and only if every entry loaded.
///
/// An ingestion failure is returned as [`PipelineError::Ingest`] and `transform` is never
/// invoked.
pub fn run_gated<S, T>(
    coordinator: &IngestionCoordinator,
    store: &mut S,
    transform: &mut T,
) -> Result<PipelineReport, PipelineError>
where
    S: TableStore + ?Sized,
    T: TransformStage + ?Sized,
{
    tracing::info!("stage 1: ingest");
    let ingest = coordinator.run_all(store).inspect_err(|failure| {
        tracing::error!(transform = transform.name(), "{failure}; transform will not run");
    })?;

    tracing::info!(transform = transform.name(), "stage 2: transform");
    let start = Instant::now();
    transform.run()?;
    let transform_elapsed = start.elapsed();
    tracing::info!(transform = transform.name(), elapsed = ?transform_elapsed, "stage 2 finished");

    Ok(PipelineReport {
        ingest,
        transform: transform.name().to_owned(),
        transform_elapsed,
    })
}
