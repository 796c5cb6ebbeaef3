//! CSV reader.

use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::infer::{normalize_column_names, parse_bool, CellKind, ColumnInference};

/// Read a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have a header row; it names the columns.
/// - Every record must have as many fields as the header.
/// - Column types are inferred from all data rows (see [`read_csv_from_reader`]).
pub fn read_csv_from_path(path: impl AsRef<Path>) -> IngestionResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    read_csv_from_reader(&mut rdr)
}

/// Read CSV data from an existing CSV reader.
///
/// A column is `Int64` if every non-empty cell parses as an integer, `Float64` if every non-empty
/// cell parses as a number, `Bool` if every non-empty cell is `true`/`false`, and `Utf8`
/// otherwise. Empty cells become [`Value::Null`]. Whitespace-only cells are ignored for inference;
/// they are `Null` in typed columns and kept verbatim in `Utf8` columns.
pub fn read_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> IngestionResult<DataSet> {
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "csv input has no header row".to_string(),
        });
    }
    let names = normalize_column_names(headers.iter());

    let mut records: Vec<csv::StringRecord> = Vec::new();
    for result in rdr.records() {
        records.push(result?);
    }

    let mut inference = vec![ColumnInference::default(); names.len()];
    for record in &records {
        for (col, inf) in inference.iter_mut().enumerate() {
            inf.observe(CellKind::of_text(record.get(col).unwrap_or("")));
        }
    }

    let fields: Vec<Field> = names
        .into_iter()
        .zip(inference)
        .map(|(name, inf)| Field::new(name, inf.resolve()))
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            fields
                .iter()
                .enumerate()
                .map(|(col, field)| typed_value(record.get(col).unwrap_or(""), field.data_type))
                .collect()
        })
        .collect();

    Ok(DataSet::new(Schema::new(fields), rows))
}

// Types were inferred from these same cells, so the typed parses cannot miss; text is the
// fallback regardless.
fn typed_value(raw: &str, data_type: DataType) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() && data_type != DataType::Utf8 {
        return Value::Null;
    }

    let typed = match data_type {
        DataType::Int64 => trimmed.parse::<i64>().ok().map(Value::Int64),
        DataType::Float64 => trimmed.parse::<f64>().ok().map(Value::Float64),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool),
        DataType::Utf8 => None,
    };
    typed.unwrap_or_else(|| Value::Utf8(raw.to_owned()))
}
