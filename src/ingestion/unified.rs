//! Unified read entrypoint.
//!
//! Most callers should use [`read_table`], which parses a file into an in-memory
//! [`crate::types::DataSet`] with a schema inferred from the source.
//!
//! If [`ReadOptions::format`] is `None`, the format is inferred from the file extension.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::types::DataSet;

use super::{csv, json, parquet};

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
    /// Apache Parquet.
    Parquet,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Options controlling how a source is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<SourceFormat>,
}

/// Read a tabular file into a [`DataSet`].
///
/// # Examples
///
/// ```no_run
/// use supply_chain_ingest::ingestion::{read_table, ReadOptions};
///
/// # fn main() -> Result<(), supply_chain_ingest::IngestionError> {
/// let ds = read_table("Dataset/olist_orders_dataset.csv", &ReadOptions::default())?;
/// println!("rows={} columns={}", ds.row_count(), ds.column_count());
/// # Ok(())
/// # }
/// ```
///
/// Force a format when the file has no (or a misleading) extension:
///
/// ```no_run
/// use supply_chain_ingest::ingestion::{read_table, ReadOptions, SourceFormat};
///
/// # fn main() -> Result<(), supply_chain_ingest::IngestionError> {
/// let opts = ReadOptions { format: Some(SourceFormat::Csv) };
/// let ds = read_table("exports/sellers", &opts)?;
/// # Ok(())
/// # }
/// ```
pub fn read_table(path: impl AsRef<Path>, options: &ReadOptions) -> IngestionResult<DataSet> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    match format {
        SourceFormat::Csv => csv::read_csv_from_path(path),
        SourceFormat::Json => json::read_json_from_path(path),
        SourceFormat::Parquet => parquet::read_parquet_from_path(path),
    }
}

/// Resolve the format [`read_table`] would use for `path`.
pub fn infer_format_from_path(path: &Path) -> IngestionResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    SourceFormat::from_extension(ext).ok_or_else(|| IngestionError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}
