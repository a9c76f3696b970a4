//! Core value model for gridtabledb.
//!
//! This crate provides the typed values that flow through the storage core:
//!
//! # Types
//! - [`DataType`] - Closed set of column type tags
//! - [`Value`] - A typed field value with a total order
//! - [`Date`] - Day-precision date stored as days since the Unix epoch
//! - [`ColumnDescriptor`] - Name, type, bounds and flags of one column
//!
//! # Error Handling
//! - [`ValueError`] - Failure to parse a literal into a [`Value`]
//!
//! # Example
//! ```
//! use gridtabledb_core::{ColumnDescriptor, DataType, Value};
//!
//! let gpa = ColumnDescriptor::new("gpa", DataType::Double, Value::Double(0.7), Value::Double(5.0));
//! assert!(gpa.data_type.is_indexable());
//! assert!(Value::Double(1.2) < gpa.max);
//! ```

pub mod column;
pub mod error;
pub mod types;

pub use column::ColumnDescriptor;
pub use error::ValueError;
pub use types::{DataType, Date, Value, UNIX_EPOCH_DAYS};
