//! Parquet reader.

use std::collections::HashMap;
use std::path::Path;

use parquet::basic::{ConvertedType, Type as PhysicalType};
use parquet::file::reader::FileReader;
use parquet::file::serialized_reader::SerializedFileReader;
use parquet::record::Field as ParquetField;
use parquet::schema::types::Type as ParquetType;

use crate::error::IngestionResult;
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Read a Parquet file into an in-memory [`DataSet`].
///
/// Notes:
/// - Columns are the top-level fields of the file schema, so a file with zero row groups still
///   yields the right column set
/// - Plain integers map to `Int64`, floats to `Float64`, booleans to `Bool`; everything else
///   (strings, dates, decimals, nested groups) is stored as display text
/// - Uses the Parquet record API (`RowIter`)
pub fn read_parquet_from_path(path: impl AsRef<Path>) -> IngestionResult<DataSet> {
    let reader = SerializedFileReader::try_from(path.as_ref())?;

    let fields: Vec<Field> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .root_schema()
        .get_fields()
        .iter()
        .map(|t| Field::new(t.name(), infer_parquet_type(t)))
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for row_res in reader.into_iter() {
        let row = row_res?;

        let map: HashMap<&str, &ParquetField> = row
            .get_column_iter()
            .map(|(name, field)| (name.as_str(), field))
            .collect();

        let out_row = fields
            .iter()
            .map(|f| map.get(f.name.as_str()).map_or(Value::Null, |v| convert_parquet_field(f.data_type, v)))
            .collect();
        rows.push(out_row);
    }

    Ok(DataSet::new(Schema::new(fields), rows))
}

fn infer_parquet_type(t: &ParquetType) -> DataType {
    if !t.is_primitive() {
        return DataType::Utf8;
    }

    let plain_int = matches!(
        t.get_basic_info().converted_type(),
        ConvertedType::NONE
            | ConvertedType::INT_8
            | ConvertedType::INT_16
            | ConvertedType::INT_32
            | ConvertedType::INT_64
            | ConvertedType::UINT_8
            | ConvertedType::UINT_16
            | ConvertedType::UINT_32
            | ConvertedType::UINT_64
    );

    match t.get_physical_type() {
        PhysicalType::BOOLEAN => DataType::Bool,
        PhysicalType::INT32 | PhysicalType::INT64 if plain_int => DataType::Int64,
        PhysicalType::FLOAT | PhysicalType::DOUBLE => DataType::Float64,
        _ => DataType::Utf8,
    }
}

fn convert_parquet_field(data_type: DataType, f: &ParquetField) -> Value {
    if matches!(f, ParquetField::Null) {
        return Value::Null;
    }

    let typed = match (data_type, f) {
        (DataType::Bool, ParquetField::Bool(b)) => Some(Value::Bool(*b)),
        (DataType::Int64, ParquetField::Byte(v)) => Some(Value::Int64(i64::from(*v))),
        (DataType::Int64, ParquetField::Short(v)) => Some(Value::Int64(i64::from(*v))),
        (DataType::Int64, ParquetField::Int(v)) => Some(Value::Int64(i64::from(*v))),
        (DataType::Int64, ParquetField::Long(v)) => Some(Value::Int64(*v)),
        (DataType::Int64, ParquetField::UByte(v)) => Some(Value::Int64(i64::from(*v))),
        (DataType::Int64, ParquetField::UShort(v)) => Some(Value::Int64(i64::from(*v))),
        (DataType::Int64, ParquetField::UInt(v)) => Some(Value::Int64(i64::from(*v))),
        (DataType::Int64, ParquetField::ULong(v)) => i64::try_from(*v).ok().map(Value::Int64),
        (DataType::Float64, ParquetField::Float(v)) => Some(Value::Float64(f64::from(*v))),
        (DataType::Float64, ParquetField::Double(v)) => Some(Value::Float64(*v)),
        _ => None,
    };

    typed.unwrap_or_else(|| match f {
        ParquetField::Str(s) => Value::Utf8(s.clone()),
        other => Value::Utf8(other.to_string()),
    })
}
