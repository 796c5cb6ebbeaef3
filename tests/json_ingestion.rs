use supply_chain_ingest::ingestion::json::{read_json_from_path, read_json_from_str};
use supply_chain_ingest::types::{DataType, Value};

#[test]
fn read_ndjson_unions_keys_in_first_seen_order() {
    let ds = read_json_from_path("tests/fixtures/sellers.ndjson").unwrap();

    assert_eq!(ds.row_count(), 3);
    assert_eq!(
        ds.schema.field_names().collect::<Vec<_>>(),
        vec!["seller_id", "seller_zip_code_prefix", "seller_city", "active", "seller_state"]
    );
    assert_eq!(ds.schema.fields[1].data_type, DataType::Int64);
    assert_eq!(ds.schema.fields[3].data_type, DataType::Bool);
    assert_eq!(ds.rows[2][3], Value::Null);
    assert_eq!(ds.rows[2][4], Value::Utf8("RJ".to_string()));
}

#[test]
fn read_json_array_widens_numbers_and_stringifies_nested_values() {
    let ds = read_json_from_path("tests/fixtures/payments.json").unwrap();

    assert_eq!(ds.row_count(), 2);
    assert_eq!(ds.schema.fields[2].data_type, DataType::Float64);
    assert_eq!(ds.rows[1][2], Value::Float64(24.0));
    assert_eq!(ds.schema.fields[3].data_type, DataType::Utf8);
    assert_eq!(ds.rows[0][3], Value::Utf8(r#"{"installments":8}"#.to_string()));
    assert_eq!(ds.rows[1][3], Value::Null);
}

#[test]
fn read_json_single_object_is_one_row() {
    let ds = read_json_from_str(r#"{"code": "en", "name": "English"}"#).unwrap();
    assert_eq!(ds.row_count(), 1);
    assert_eq!(ds.column_count(), 2);
}

#[test]
fn read_json_rejects_non_object_rows() {
    let err = read_json_from_str("[1, 2]").unwrap_err();
    assert!(err.to_string().contains("row 1 is not a json object"));
}

#[test]
fn read_json_rejects_empty_input_and_empty_arrays() {
    assert!(read_json_from_str("   ").unwrap_err().to_string().contains("empty"));
    assert!(read_json_from_str("[]").unwrap_err().to_string().contains("no columns"));
}

#[test]
fn read_json_reports_bad_ndjson_lines() {
    let err = read_json_from_str("{\"a\": 1}\n{not json}\n").unwrap_err();
    assert!(err.to_string().contains("json error"));
}

#[test]
fn read_json_keys_differing_only_in_case_get_distinct_columns() {
    let ds = read_json_from_str("{\"Id\": 1, \"id\": 2}\n{\"id\": 3}\n").unwrap();

    assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["Id", "id.1"]);
    assert_eq!(ds.rows[0], vec![Value::Int64(1), Value::Int64(2)]);
    assert_eq!(ds.rows[1], vec![Value::Null, Value::Int64(3)]);
}
