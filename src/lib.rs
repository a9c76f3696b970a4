//! gridtabledb - a paged, clustering-key ordered table store with grid indices.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          gridtabledb                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                  Table Layer (table/)                    │   │
//! │  │   insert / update / delete / select, max-key cache,      │   │
//! │  │   overflow cascade, index reconciliation                 │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                 ↓                              ↓                │
//! │  ┌──────────────────────────┐   ┌──────────────────────────┐   │
//! │  │   Pages (storage/page)   │   │   Grid Index (index/)    │   │
//! │  │  key-sorted, bounded     │←──│  ranges → slots → bucket │   │
//! │  │  runs of rows            │   │  chains of (page, offset)│   │
//! │  └──────────────────────────┘   └──────────────────────────┘   │
//! │                 ↓                              ↓                │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Storage Layer (storage/)                    │   │
//! │  │   DiskManager: one directory per table, atomic rewrite   │   │
//! │  │   of whole files, FileHeader + CRC32 + JSON payload      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, BucketId, IndexId, Error, config)
//! - [`storage`] - Disk I/O, rows and pages
//! - [`index`] - Grid index, buckets and range partitions
//! - [`table`] - Tables, schemas and selects
//!
//! Typed values and column descriptors live in the `gridtabledb-core` crate.
//!
//! # Quick Start
//! ```no_run
//! use gridtabledb::table::{Combinator, Operator, SelectTerm, TableSchema};
//! use gridtabledb::{Row, StorageConfig, Table};
//! use gridtabledb_core::{ColumnDescriptor, DataType, Value};
//!
//! let schema = TableSchema::new(
//!     "students",
//!     vec![
//!         ColumnDescriptor::new("id", DataType::Int, Value::Int(0), Value::Int(10_000)).clustering(),
//!         ColumnDescriptor::new("gpa", DataType::Double, Value::Double(0.7), Value::Double(5.0)),
//!     ],
//! )
//! .unwrap();
//!
//! let mut table = Table::create("data", schema, StorageConfig::new(200, 20)).unwrap();
//! table
//!     .insert(Row::from_pairs("id", [("id", Value::Int(1)), ("gpa", Value::Double(1.2))]))
//!     .unwrap();
//! table.create_index(&["gpa"]).unwrap();
//!
//! let terms = [SelectTerm::new("students", "gpa", Operator::Lt, Value::Double(2.0))];
//! for row in table.select(&terms, Combinator::And).unwrap() {
//!     println!("{}", row.unwrap());
//! }
//! ```

pub mod common;
pub mod index;
pub mod storage;
pub mod table;

// Re-export commonly used items at crate root for convenience
pub use common::{BucketId, Error, IndexId, PageId, Result, StorageConfig};

pub use index::grid::{Bucket, GridIndex, RowRef};
pub use storage::page::Page;
pub use storage::{DiskManager, FieldMap, Row, StatsSnapshot, StorageStats};
pub use table::{Catalog, Combinator, Operator, SelectTerm, Table, TableSchema};
