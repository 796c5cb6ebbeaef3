//! `supply-chain-ingest` is a two-stage batch pipeline: it loads a fixed set of tabular datasets
//! into relational tables, then triggers a downstream SQL transformation job, and only does the
//! second when every load of the first succeeded.
//!
//! ## Stage 1: ingest
//!
//! Each [`pipeline::DatasetEntry`] maps one source file to one table. The
//! [`pipeline::DatasetLoader`] checks the source exists, parses all of it into an in-memory
//! [`types::DataSet`] (column names and types inferred from the source), and replaces the target
//! table through a [`store::TableStore`]. The replace is staged in batches and swapped in
//! atomically, so a failed load leaves the previous table as it was.
//!
//! The [`pipeline::IngestionCoordinator`] loads entries in declared order and stops at the first
//! failure, returning a [`RunFailure`] that names the failing entry.
//!
//! **Source formats (auto-detected by extension):**
//!
//! - **CSV**: `.csv`
//! - **JSON**: `.json` (array-of-objects) and `.ndjson` (newline-delimited objects)
//! - **Parquet**: `.parquet`, `.pq`
//!
//! ## Stage 2: transform
//!
//! [`pipeline::run_gated`] runs the coordinator and then a [`pipeline::TransformStage`] (by
//! default `dbt run --profiles-dir .` via [`pipeline::CommandStage`]). If ingestion fails the
//! transform is never invoked, and the binary exits non-zero so a scheduler can see it.
//!
//! ## Quick example
//!
//! ```rust
//! use supply_chain_ingest::pipeline::{DatasetEntry, IngestionCoordinator, IngestionPlan};
//! use supply_chain_ingest::store::{SqliteStore, WriteOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! std::fs::write(dir.path().join("sellers.csv"), "seller_id,zip\ns1,13023\ns2,4195\n")?;
//!
//! let coordinator = IngestionCoordinator::new(IngestionPlan {
//!     entries: vec![DatasetEntry::new(dir.path().join("sellers.csv"), "sellers")],
//!     write: WriteOptions::default(),
//! })?;
//! let mut store = SqliteStore::open_in_memory()?;
//!
//! let report = coordinator.run_all(&mut store)?;
//! assert_eq!(report.total_rows(), 2);
//! assert_eq!(store.row_count("sellers")?, 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: source readers and load observers
//! - [`store`]: table stores (SQLite)
//! - [`pipeline`]: loader, coordinator and stage gate
//! - [`config`]: layered configuration
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod store;
pub mod types;

pub use error::{
    ConfigError, IngestionError, IngestionResult, LoadCause, LoadError, PipelineError, RunFailure, StoreError,
    StoreResult, TransformError,
};
