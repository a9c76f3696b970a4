//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;

use gridtabledb::table::TableSchema;
use gridtabledb::{FieldMap, Row, Table};
use gridtabledb_core::{ColumnDescriptor, DataType, Date, Value};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; `RUST_LOG=gridtabledb=debug` shows engine logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn students_schema() -> TableSchema {
    TableSchema::new(
        "students",
        vec![
            ColumnDescriptor::new("id", DataType::Int, Value::Int(0), Value::Int(10_000)).clustering(),
            ColumnDescriptor::new("name", DataType::Text, Value::from("A"), Value::from("zzzzzz")),
            ColumnDescriptor::new("gpa", DataType::Double, Value::Double(0.7), Value::Double(5.0)),
            ColumnDescriptor::new("age", DataType::Int, Value::Int(0), Value::Int(100)),
            ColumnDescriptor::new(
                "dob",
                DataType::Date,
                Value::Date(Date::from_ymd(1990, 1, 1).unwrap()),
                Value::Date(Date::from_ymd(2010, 12, 31).unwrap()),
            ),
        ],
    )
    .unwrap()
}

pub fn student(id: i32, name: &str, gpa: f64, age: i32) -> Row {
    Row::from_pairs(
        "id",
        [
            ("id", Value::Int(id)),
            ("name", Value::from(name)),
            ("gpa", Value::Double(gpa)),
            ("age", Value::Int(age)),
        ],
    )
}

pub fn key_row(id: i32) -> Row {
    Row::from_pairs("id", [("id", Value::Int(id))])
}

pub fn fields(pairs: &[(&str, Value)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn int_key(row: &Row) -> i32 {
    match row.key() {
        Some(Value::Int(k)) => *k,
        other => panic!("unexpected key {:?}", other),
    }
}

/// Keys of every row, in scan order.
pub fn keys(table: &Table) -> Vec<i32> {
    table.scan().map(|row| int_key(&row.unwrap())).collect()
}

/// Keys grouped by page, in page order.
pub fn page_keys(table: &Table) -> Vec<Vec<i32>> {
    table
        .page_ids()
        .iter()
        .map(|&id| table.load_page(id).unwrap().rows().iter().map(int_key).collect())
        .collect()
}

/// Every row is referenced exactly once by every index, and every reference
/// sits in the slot its row's values map to.
pub fn assert_indices_consistent(table: &Table) {
    let rows = table.row_count().unwrap();
    for index in table.indices() {
        let refs = table.index_references(index.id()).unwrap();
        let mut seen = BTreeSet::new();
        for (slot, r) in &refs {
            let page = table.load_page(r.page).unwrap();
            let row = page
                .row_at(r.offset)
                .unwrap_or_else(|| panic!("{} points past the end of its page", r));
            assert_eq!(
                *slot,
                index.slot_of(row.fields()),
                "{} holds {} in the wrong slot",
                index.id(),
                row
            );
            assert!(seen.insert(*r), "{} referenced twice", r);
        }
        assert_eq!(refs.len(), rows, "{} misses rows", index.id());
    }
}
