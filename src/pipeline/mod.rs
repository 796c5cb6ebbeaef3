//! The two-stage pipeline: per-dataset loads, the fail-fast coordinator, and the gate that keeps
//! the transformation from running on a partial ingest.
//!
//! ```no_run
//! use supply_chain_ingest::pipeline::{
//!     olist_entries, run_gated, CommandStage, IngestionCoordinator, IngestionPlan,
//! };
//! use supply_chain_ingest::store::{SqliteStore, WriteOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = IngestionCoordinator::new(IngestionPlan {
//!     entries: olist_entries("Dataset".as_ref()),
//!     write: WriteOptions::default(),
//! })?;
//! let mut store = SqliteStore::open("supply_chain.db")?;
//! let mut dbt = CommandStage::new("dbt")
//!     .args(["run", "--profiles-dir", "."])
//!     .working_dir("analytics");
//!
//! let report = run_gated(&coordinator, &mut store, &mut dbt)?;
//! println!("{} rows ingested", report.ingest.total_rows());
//! # Ok(())
//! # }
//! ```

mod coordinator;
mod entry;
mod gate;
mod loader;

pub use coordinator::{IngestionCoordinator, IngestionPlan, RunReport};
pub use entry::{olist_entries, DatasetEntry, OLIST_DATASETS};
pub use gate::{run_gated, CommandStage, PipelineReport, TransformStage};
pub use loader::{severity_for_error, DatasetLoader};
