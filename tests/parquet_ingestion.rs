use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;

use supply_chain_ingest::ingestion::parquet::read_parquet_from_path;
use supply_chain_ingest::ingestion::{read_table, ReadOptions};
use supply_chain_ingest::types::{DataType, Value};

fn write_items_parquet(path: &Path) {
    let schema_str = r#"
    message schema {
      REQUIRED INT64 order_item_id;
      REQUIRED BINARY product_id (UTF8);
      REQUIRED DOUBLE price;
      REQUIRED BOOLEAN shipped;
      REQUIRED INT32 shipping_day (DATE);
    }
    "#;

    let schema = Arc::new(parse_message_type(schema_str).unwrap());
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();

    let mut rg = writer.next_row_group().unwrap();
    while let Some(mut col) = rg.next_column().unwrap() {
        match col.untyped() {
            ColumnWriter::Int64ColumnWriter(w) => {
                w.write_batch(&[1_i64, 2_i64], None, None).unwrap();
            }
            ColumnWriter::ByteArrayColumnWriter(w) => {
                let v1 = ByteArray::from("4244733e06e7ecb4970a6e2683c13e61");
                let v2 = ByteArray::from("e5f2d52b802189ee658865ca93d83a8f");
                w.write_batch(&[v1, v2], None, None).unwrap();
            }
            ColumnWriter::DoubleColumnWriter(w) => {
                w.write_batch(&[58.9_f64, 239.9_f64], None, None).unwrap();
            }
            ColumnWriter::BoolColumnWriter(w) => {
                w.write_batch(&[true, false], None, None).unwrap();
            }
            ColumnWriter::Int32ColumnWriter(w) => {
                w.write_batch(&[17_440_i32, 17_441_i32], None, None).unwrap();
            }
            _ => panic!("unexpected column writer in test"),
        }
        col.close().unwrap();
    }
    rg.close().unwrap();
    writer.close().unwrap();
}

#[test]
fn read_parquet_maps_physical_types() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order_items.parquet");
    write_items_parquet(&path);

    let ds = read_parquet_from_path(&path).unwrap();

    assert_eq!(ds.row_count(), 2);
    let types: Vec<DataType> = ds.schema.fields.iter().map(|f| f.data_type).collect();
    assert_eq!(
        types,
        vec![
            DataType::Int64,
            DataType::Utf8,
            DataType::Float64,
            DataType::Bool,
            DataType::Utf8,
        ]
    );
    assert_eq!(ds.rows[1][0], Value::Int64(2));
    assert_eq!(ds.rows[0][1], Value::Utf8("4244733e06e7ecb4970a6e2683c13e61".to_string()));
    assert_eq!(ds.rows[1][2], Value::Float64(239.9));
    assert_eq!(ds.rows[1][3], Value::Bool(false));
    assert!(matches!(ds.rows[0][4], Value::Utf8(_)));
}

#[test]
fn read_table_detects_parquet_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order_items.pq");
    write_items_parquet(&path);

    let ds = read_table(&path, &ReadOptions::default()).unwrap();
    assert_eq!(ds.column_count(), 5);
}

#[test]
fn read_parquet_errors_on_non_parquet_file() {
    let err = read_parquet_from_path("tests/fixtures/orders.csv").unwrap_err();
    assert!(err.to_string().contains("parquet error"));
}
