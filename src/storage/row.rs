//! Rows and row access.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use gridtabledb_core::Value;
use serde::{Deserialize, Serialize};

use crate::common::{PageId, Result};

/// Column name to value. Also used as an equality predicate.
pub type FieldMap = BTreeMap<String, Value>;

/// One row of a table.
///
/// A column missing from `fields` is null. The clustering-key column is always
/// present once the row has been inserted.
///
/// # Example
/// ```
/// use gridtabledb::Row;
/// use gridtabledb_core::Value;
///
/// let row = Row::from_pairs("id", [("id", Value::Int(7)), ("name", Value::from("Ali"))]);
/// assert_eq!(row.key(), Some(&Value::Int(7)));
/// assert!(row.get("gpa").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    key_column: String,
    fields: FieldMap,
}

impl Row {
    pub fn new(key_column: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            key_column: key_column.into(),
            fields,
        }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K>(key_column: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let fields = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::new(key_column, fields)
    }

    #[inline]
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// The clustering-key value.
    #[inline]
    pub fn key(&self) -> Option<&Value> {
        self.fields.get(&self.key_column)
    }

    /// Compare this row's clustering key with `key`.
    ///
    /// A row without a key sorts before everything.
    pub fn compare_key(&self, key: &Value) -> Ordering {
        match self.key() {
            Some(own) => own.cmp(key),
            None => Ordering::Less,
        }
    }

    #[inline]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.fields.insert(column.into(), value);
    }

    #[inline]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn into_fields(self) -> FieldMap {
        self.fields
    }

    /// Equality on one column. A null field never matches.
    pub fn matches_value(&self, column: &str, value: &Value) -> bool {
        self.get(column).map_or(false, |v| v == value)
    }

    /// Whether every `(column, value)` of `predicate` matches this row.
    ///
    /// An empty predicate matches every row.
    pub fn matches_all(&self, predicate: &FieldMap) -> bool {
        predicate
            .iter()
            .all(|(column, value)| self.matches_value(column, value))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (column, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", column, value)?;
        }
        write!(f, "}}")
    }
}

/// Anything that can dereference a `(page, offset)` location.
///
/// Implemented by a single in-memory [`Page`](crate::storage::page::Page)
/// (locations on other pages resolve to `None`) and by the
/// [`DiskManager`](crate::storage::DiskManager), which loads the page.
pub trait RowSource {
    fn resolve(&self, page: PageId, offset: usize) -> Result<Option<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i32, name: &str) -> Row {
        Row::from_pairs("id", [("id", Value::Int(id)), ("name", Value::from(name))])
    }

    #[test]
    fn test_key_and_compare() {
        let row = student(5, "Ali");
        assert_eq!(row.key_column(), "id");
        assert_eq!(row.compare_key(&Value::Int(4)), Ordering::Greater);
        assert_eq!(row.compare_key(&Value::Int(5)), Ordering::Equal);
        assert_eq!(row.compare_key(&Value::Int(6)), Ordering::Less);
    }

    #[test]
    fn test_null_never_matches() {
        let row = student(1, "Ali");
        assert!(row.matches_value("name", &Value::from("Ali")));
        assert!(!row.matches_value("gpa", &Value::Double(1.0)));
    }

    #[test]
    fn test_matches_all() {
        let row = student(1, "Ali");
        let mut predicate = FieldMap::new();
        assert!(row.matches_all(&predicate));

        predicate.insert("name".to_string(), Value::from("Ali"));
        assert!(row.matches_all(&predicate));

        predicate.insert("id".to_string(), Value::Int(2));
        assert!(!row.matches_all(&predicate));
    }

    #[test]
    fn test_set_and_display() {
        let mut row = student(1, "Ali");
        row.set("gpa", Value::Double(1.5));
        assert_eq!(row.to_string(), "{gpa: 1.5, id: 1, name: Ali}");
    }
}
