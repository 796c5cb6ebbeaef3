//! Source readers and load narration.
//!
//! Most callers should use [`read_table`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`ReadOptions`])
//! - parses the whole source into an in-memory [`crate::types::DataSet`]
//! - infers column names and types from the source itself
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - [`parquet`]

pub mod csv;
mod infer;
pub mod json;
pub mod observability;
pub mod parquet;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, LoadContext, LoadObserver, LoadSeverity, LoadStats, TracingObserver,
};
pub use unified::{infer_format_from_path, read_table, ReadOptions, SourceFormat};
