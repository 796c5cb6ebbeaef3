//! Layered pipeline configuration.
//!
//! Priority (highest to lowest):
//! 1. Explicit overrides merged by the caller (CLI flags)
//! 2. Environment variables (prefixed with `PIPELINE_`, nested keys split on `__`)
//! 3. TOML config file
//! 4. Built-in defaults
//!
//! The result is an explicit value handed to the coordinator; nothing downstream reads the
//! environment.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pipeline::{olist_entries, CommandStage, DatasetEntry, IngestionPlan};
use crate::store::{WriteOptions, DEFAULT_BATCH_SIZE};

/// Prefix of environment variables read by [`PipelineConfig::figment`].
pub const ENV_PREFIX: &str = "PIPELINE_";

/// A single, unified struct holding all pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub logging: LoggingConfig,
    pub store: StoreConfig,
    pub ingest: IngestConfig,
    pub transform: CommandStage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Optional file that per-dataset narration is appended to.
    pub narration_log: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Rows per insert batch.
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory relative sources are resolved against.
    pub base_dir: PathBuf,
    /// Entries in load order. Empty means the Olist reference set.
    pub datasets: Vec<DatasetEntry>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            narration_log: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("supply_chain.db"),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("Dataset"),
            datasets: Vec::new(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
            transform: CommandStage::new("dbt")
                .args(["run", "--profiles-dir", "."])
                .working_dir("analytics"),
        }
    }
}

impl PipelineConfig {
    /// Defaults, then the TOML file at `config_path` (if any), then `PIPELINE_` env vars.
    ///
    /// Callers may merge further overrides before calling [`Self::from_figment`].
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract a config from a prepared figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Figment(Box::new(e)))
    }

    /// Load from defaults, an optional TOML file, and the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(config_path))
    }

    /// Write options derived from the store section.
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            batch_size: self.store.batch_size,
        }
    }

    /// Entries with sources resolved against `ingest.base_dir`.
    pub fn entries(&self) -> Vec<DatasetEntry> {
        if self.ingest.datasets.is_empty() {
            return olist_entries(&self.ingest.base_dir);
        }
        self.ingest
            .datasets
            .iter()
            .cloned()
            .map(|e| e.resolved_against(&self.ingest.base_dir))
            .collect()
    }

    /// The ingestion plan described by this config.
    pub fn plan(&self) -> IngestionPlan {
        IngestionPlan {
            entries: self.entries(),
            write: self.write_options(),
        }
    }
}
