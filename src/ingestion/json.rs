//! JSON reader.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - A single JSON object (one row)
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Columns are the union of top-level keys in first-seen order, named with the same rules as CSV
//! headers. Nested objects and arrays are stored as their JSON text.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::infer::{normalize_column_names, CellKind, ColumnInference};

type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Read a JSON/NDJSON file into an in-memory [`DataSet`].
pub fn read_json_from_path(path: impl AsRef<Path>) -> IngestionResult<DataSet> {
    let text = fs::read_to_string(path)?;
    read_json_from_str(&text)
}

/// Read JSON from an in-memory string into a [`DataSet`].
pub fn read_json_from_str(input: &str) -> IngestionResult<DataSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    let values = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Array(items)) => items,
        Ok(v @ serde_json::Value::Object(_)) => vec![v],
        Ok(_) => {
            return Err(IngestionError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            });
        }
        // Fall back to NDJSON.
        Err(_) => trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str::<serde_json::Value>)
            .collect::<Result<Vec<_>, _>>()?,
    };

    let objects = values
        .iter()
        .enumerate()
        .map(|(idx0, v)| {
            v.as_object().ok_or_else(|| IngestionError::SchemaMismatch {
                message: format!("row {} is not a json object", idx0 + 1),
            })
        })
        .collect::<IngestionResult<Vec<&JsonObject>>>()?;

    read_json_objects(&objects)
}

fn read_json_objects(objects: &[&JsonObject]) -> IngestionResult<DataSet> {
    let mut keys: Vec<&str> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut inference: Vec<ColumnInference> = Vec::new();

    for obj in objects {
        for (key, v) in obj.iter() {
            let col = *index.entry(key.as_str()).or_insert_with(|| {
                keys.push(key.as_str());
                inference.push(ColumnInference::default());
                keys.len() - 1
            });
            inference[col].observe(CellKind::of_json(v));
        }
    }

    if keys.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "json input has no columns".to_string(),
        });
    }

    // Keys map to columns by position; only the column names are normalized.
    let fields: Vec<Field> = normalize_column_names(keys.iter().copied())
        .into_iter()
        .zip(inference)
        .map(|(name, inf)| Field::new(name, inf.resolve()))
        .collect();

    let rows = objects
        .iter()
        .map(|obj| {
            let mut row = vec![Value::Null; fields.len()];
            for (key, v) in obj.iter() {
                if let Some(&col) = index.get(key.as_str()) {
                    row[col] = typed_value(v, fields[col].data_type);
                }
            }
            row
        })
        .collect();

    Ok(DataSet::new(Schema::new(fields), rows))
}

fn typed_value(v: &serde_json::Value, data_type: DataType) -> Value {
    if v.is_null() {
        return Value::Null;
    }

    let typed = match data_type {
        DataType::Int64 => v.as_i64().map(Value::Int64),
        DataType::Float64 => v.as_f64().map(Value::Float64),
        DataType::Bool => v.as_bool().map(Value::Bool),
        DataType::Utf8 => None,
    };
    typed.unwrap_or_else(|| match v {
        serde_json::Value::String(s) => Value::Utf8(s.clone()),
        other => Value::Utf8(other.to_string()),
    })
}
