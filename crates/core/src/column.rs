//! Column descriptors handed to the storage core by the catalog.

use serde::{Deserialize, Serialize};

use crate::types::{DataType, Value};

/// Everything the storage core needs to know about one column.
///
/// Descriptors come from the catalog already validated: `min` and `max` carry
/// the column's own type and `min <= max`.
///
/// # Example
/// ```
/// use gridtabledb_core::{ColumnDescriptor, DataType, Value};
///
/// let id = ColumnDescriptor::new("id", DataType::Int, Value::Int(0), Value::Int(1000))
///     .clustering();
/// assert!(id.clustering_key);
/// assert!(!id.indexed);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
    pub min: Value,
    pub max: Value,
    pub clustering_key: bool,
    pub indexed: bool,
}

impl ColumnDescriptor {
    /// Create a non-key, non-indexed column.
    pub fn new(name: impl Into<String>, data_type: DataType, min: Value, max: Value) -> Self {
        Self {
            name: name.into(),
            data_type,
            min,
            max,
            clustering_key: false,
            indexed: false,
        }
    }

    /// Mark this column as the table's clustering key.
    pub fn clustering(mut self) -> Self {
        self.clustering_key = true;
        self
    }

    /// Whether `min` and `max` both carry this column's type.
    pub fn bounds_match_type(&self) -> bool {
        self.min.data_type() == self.data_type && self.max.data_type() == self.data_type
    }
}
