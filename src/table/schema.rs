//! Table schemas and the catalog seam.

use std::collections::HashSet;

use gridtabledb_core::ColumnDescriptor;
use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

/// Source of column descriptors for a table.
///
/// The catalog is owned elsewhere; the storage core only ever reads it.
pub trait Catalog {
    /// Descriptors of every column of `table`, in declaration order.
    fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;
}

/// Validated column set of one table.
///
/// # Example
/// ```
/// use gridtabledb::table::TableSchema;
/// use gridtabledb_core::{ColumnDescriptor, DataType, Value};
///
/// let schema = TableSchema::new(
///     "students",
///     vec![
///         ColumnDescriptor::new("id", DataType::Int, Value::Int(0), Value::Int(10_000)).clustering(),
///         ColumnDescriptor::new("name", DataType::Text, Value::from("A"), Value::from("zzzz")),
///     ],
/// )
/// .unwrap();
/// assert_eq!(schema.key_column().name, "id");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnDescriptor>,
    key_index: usize,
}

impl TableSchema {
    /// Build a schema.
    ///
    /// # Errors
    /// `Error::InvalidSchema` unless the name is non-empty, column names are
    /// unique, exactly one column is the clustering key, and every column's
    /// bounds are finite, carry its type and satisfy `min <= max`.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidSchema("table name is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column `{}`",
                    column.name
                )));
            }
            if !column.bounds_match_type() {
                return Err(Error::InvalidSchema(format!(
                    "bounds of `{}` are not {}",
                    column.name, column.data_type
                )));
            }
            if !column.min.is_finite() || !column.max.is_finite() {
                return Err(Error::InvalidSchema(format!(
                    "bounds of `{}` are not finite",
                    column.name
                )));
            }
            if column.min > column.max {
                return Err(Error::InvalidSchema(format!(
                    "min of `{}` exceeds its max",
                    column.name
                )));
            }
        }

        let mut keys = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.clustering_key)
            .map(|(i, _)| i);
        let key_index = match (keys.next(), keys.next()) {
            (Some(i), None) => i,
            (None, _) => {
                return Err(Error::InvalidSchema(format!(
                    "table `{}` has no clustering key",
                    name
                )))
            }
            (Some(_), Some(_)) => {
                return Err(Error::InvalidSchema(format!(
                    "table `{}` has more than one clustering key",
                    name
                )))
            }
        };

        Ok(Self {
            name,
            columns,
            key_index,
        })
    }

    /// Read a table's columns from a catalog.
    pub fn from_catalog(catalog: &dyn Catalog, table: &str) -> Result<Self> {
        Self::new(table, catalog.columns(table)?)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    #[inline]
    pub fn key_column(&self) -> &ColumnDescriptor {
        &self.columns[self.key_index]
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`column`](Self::column), but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<&ColumnDescriptor> {
        self.column(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    pub(crate) fn mark_indexed(&mut self, name: &str) {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.indexed = true;
        }
    }
}
