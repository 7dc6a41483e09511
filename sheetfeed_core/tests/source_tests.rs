use std::collections::BTreeMap;

use serde_json::{json, Value};
use sheetfeed_core::headers::process_headers;
use sheetfeed_core::streams::{build_record, header_schema};
use sheetfeed_core::{
    ExcelSheetsSource, Message, MessageWriter, RangeData, Source, SourceConfig,
};

fn config(value: Value) -> SourceConfig {
    SourceConfig::from_value(value).unwrap()
}

fn base_config() -> SourceConfig {
    config(json!({
        "workbook_path": "/Documents/Orders.xlsx",
        "credentials": {
            "auth_type": "Client",
            "client_id": "app-id",
            "client_secret": "app-secret",
            "refresh_token": "rt"
        }
    }))
}

// A usedRange payload the way Graph returns it: header row first, then data,
// with a duplicated header and a blank padding row in the middle.
fn orders_used_range() -> RangeData {
    serde_json::from_value(json!({
        "address": "Orders!A1:D5",
        "rowCount": 5,
        "columnCount": 4,
        "values": [
            ["Order Id", "Customer", "Order Date", "Order Id"],
            ["1001", "Acme", 45292, "dup-a"],
            ["", "", "", ""],
            ["1002", "Globex", 45293, "dup-b"],
            ["1003", "", null, ""]
        ]
    }))
    .unwrap()
}

#[test]
fn spec_embeds_the_config_schema() {
    let source = ExcelSheetsSource::new();
    let spec = source.spec();
    assert!(spec.documentation_url.is_some());
    let schema = &spec.connection_specification;
    assert!(schema.pointer("/properties/workbook_path").is_some());
    assert!(schema.pointer("/properties/credentials").is_some());
}

#[test]
fn headers_from_fixture_disambiguate_duplicates() {
    let range = orders_used_range();
    let (headers, mapping) = process_headers(&range.values[0], false);
    assert_eq!(headers, vec!["Order Id", "Customer", "Order Date", "Order Id_D1"]);
    assert_eq!(mapping.len(), 4);

    let schema = header_schema(&mapping);
    assert!(schema.pointer("/properties/Order Id").is_some());
    assert!(schema.pointer("/properties/Order Id_D1").is_some());
}

#[test]
fn records_from_fixture_skip_blank_rows_and_parse_dates() {
    let cfg = base_config();
    let range = orders_used_range();
    let (_, mapping) = process_headers(&range.values[0], cfg.names_conversion);

    let records: Vec<Value> = range.values[1..]
        .iter()
        .filter_map(|row| build_record(row, &mapping, cfg.parse_dates))
        .collect();

    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0],
        json!({
            "Order Id": "1001",
            "Customer": "Acme",
            "Order Date": "2023-12-31",
            "Order Id_D1": "dup-a"
        })
    );
    // Blank cells drop out of the record entirely.
    assert_eq!(records[2], json!({"Order Id": "1003"}));
}

#[test]
fn names_conversion_changes_record_keys() {
    let cfg = config(json!({
        "workbook_path": "/Orders.xlsx",
        "credentials": {
            "auth_type": "Client",
            "client_id": "app-id",
            "client_secret": "app-secret",
            "refresh_token": "rt"
        },
        "names_conversion": true
    }));
    let range = orders_used_range();
    let (headers, mapping) = process_headers(&range.values[0], cfg.names_conversion);
    assert_eq!(headers, vec!["order_id", "customer", "order_date", "order_id_D1"]);

    let record = build_record(&range.values[1], &mapping, cfg.parse_dates).unwrap();
    assert_eq!(record["order_id"], "1001");
    assert_eq!(record["order_date"], "2023-12-31");
}

#[test]
fn record_messages_serialize_for_the_wire() {
    let mut writer = MessageWriter::new(Vec::new());
    writer
        .write(&Message::record("orders".to_string(), json!({"id": "1"})))
        .unwrap();
    let out = String::from_utf8(writer.into_inner()).unwrap();
    let value: Value = serde_json::from_str(out.trim_end()).unwrap();
    assert_eq!(value["type"], "RECORD");
    assert_eq!(value["record"]["stream"], "orders");
    assert_eq!(value["record"]["data"]["id"], "1");
}

#[test]
fn empty_mapping_means_no_schema_properties() {
    let mapping: BTreeMap<usize, String> = BTreeMap::new();
    let schema = header_schema(&mapping);
    assert_eq!(schema["properties"], json!({}));
    assert_eq!(schema["additionalProperties"], json!(true));
}
