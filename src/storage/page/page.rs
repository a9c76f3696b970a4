//! Page - the unit of persistence for rows.
//!
//! A [`Page`] holds at most `capacity` rows, strictly ascending by clustering
//! key. Offsets are positions in that order, so inserting or removing a row
//! shifts the offsets of every row after it. Callers that keep references to
//! rows (the grid indices) must be told about every shift.

use std::collections::BTreeSet;
use std::fmt;

use gridtabledb_core::{DataType, Value};
use serde::{Deserialize, Serialize};

use crate::common::{Error, PageId, Result};
use crate::storage::row::{FieldMap, Row, RowSource};

/// Result of [`Page::insert_sorted`].
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    /// Offset the new row was placed at.
    pub offset: usize,
    /// Row evicted from the end of a page that was already full.
    pub overflow: Option<Row>,
}

/// A capacity-bounded, key-sorted run of rows.
///
/// # Example
/// ```
/// use gridtabledb::{PageId, Row};
/// use gridtabledb::storage::page::Page;
/// use gridtabledb_core::{DataType, Value};
///
/// let mut page = Page::new(PageId::new(0), 2, "id", DataType::Int);
/// page.insert_sorted(Row::from_pairs("id", [("id", Value::Int(3))])).unwrap();
/// page.insert_sorted(Row::from_pairs("id", [("id", Value::Int(1))])).unwrap();
///
/// let outcome = page.insert_sorted(Row::from_pairs("id", [("id", Value::Int(2))])).unwrap();
/// assert_eq!(outcome.offset, 1);
/// assert_eq!(outcome.overflow.unwrap().key(), Some(&Value::Int(3)));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    id: PageId,
    capacity: usize,
    key_column: String,
    key_type: DataType,
    rows: Vec<Row>,
}

impl Page {
    /// Create an empty page.
    pub fn new(id: PageId, capacity: usize, key_column: impl Into<String>, key_type: DataType) -> Self {
        Self {
            id,
            capacity,
            key_column: key_column.into(),
            key_type,
            rows: Vec::with_capacity(capacity),
        }
    }

    // ========================================================================
    // READERS
    // ========================================================================

    #[inline]
    pub fn id(&self) -> PageId {
        self.id
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    #[inline]
    pub fn key_type(&self) -> DataType {
        self.key_type
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    #[inline]
    pub fn row_at(&self, offset: usize) -> Option<&Row> {
        self.rows.get(offset)
    }

    /// Clustering key of the last row.
    pub fn max_key(&self) -> Option<&Value> {
        self.rows.last().and_then(Row::key)
    }

    /// Offset of the row with clustering key `key`.
    pub fn find(&self, key: &Value) -> Option<usize> {
        self.rows.binary_search_by(|row| row.compare_key(key)).ok()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Insert `row` at its sorted position.
    ///
    /// If the page was already full the last row is evicted and returned as
    /// the overflow.
    ///
    /// # Errors
    /// - `Error::MissingClusteringKey` if the row has no key
    /// - `Error::DuplicateClusteringKey` if the key is already on this page;
    ///   the page is left unchanged
    pub fn insert_sorted(&mut self, row: Row) -> Result<InsertOutcome> {
        let key = row
            .key()
            .ok_or_else(|| Error::MissingClusteringKey(self.key_column.clone()))?;

        let offset = match self.rows.binary_search_by(|r| r.compare_key(key)) {
            Ok(_) => return Err(Error::DuplicateClusteringKey(key.to_string())),
            Err(pos) => pos,
        };

        self.rows.insert(offset, row);
        let overflow = if self.rows.len() > self.capacity {
            self.rows.pop()
        } else {
            None
        };

        Ok(InsertOutcome { offset, overflow })
    }

    /// Append without checking order or capacity.
    ///
    /// Only for rows known to sort after everything on the page.
    pub fn append_blind(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Apply `changes` to the row with clustering key `key`.
    ///
    /// Returns the row before and after the change.
    pub fn update_by_key(&mut self, key: &Value, changes: &FieldMap) -> Option<(Row, Row)> {
        let offset = self.find(key)?;
        let row = &mut self.rows[offset];
        let old = row.clone();
        for (column, value) in changes {
            row.set(column.clone(), value.clone());
        }
        Some((old, row.clone()))
    }

    /// Remove the row with clustering key `key` if it also matches `residual`.
    ///
    /// Returns the offset the row occupied.
    pub fn delete_at(&mut self, key: &Value, residual: &FieldMap) -> Option<usize> {
        let offset = self.find(key)?;
        if !self.rows[offset].matches_all(residual) {
            return None;
        }
        self.rows.remove(offset);
        Some(offset)
    }

    /// Remove every row matching `predicate`.
    ///
    /// Returns the original offsets of the removed rows, ascending.
    pub fn delete_all_matching(&mut self, predicate: &FieldMap) -> Vec<usize> {
        let removed: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.matches_all(predicate))
            .map(|(offset, _)| offset)
            .collect();

        if !removed.is_empty() {
            self.rows.retain(|row| !row.matches_all(predicate));
        }
        removed
    }

    /// Remove the rows at `offsets` that still match `predicate`.
    ///
    /// Offsets past the end are ignored. Returns the offsets removed,
    /// ascending.
    pub fn delete_at_offsets(&mut self, offsets: &BTreeSet<usize>, predicate: &FieldMap) -> Vec<usize> {
        let removed: Vec<usize> = offsets
            .iter()
            .copied()
            .filter(|&offset| {
                self.rows
                    .get(offset)
                    .map_or(false, |row| row.matches_all(predicate))
            })
            .collect();

        for &offset in removed.iter().rev() {
            self.rows.remove(offset);
        }
        removed
    }
}

impl RowSource for Page {
    fn resolve(&self, page: PageId, offset: usize) -> Result<Option<Row>> {
        if page != self.id {
            return Ok(None);
        }
        Ok(self.rows.get(offset).cloned())
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} [{}/{}] key: {} {}",
            self.id,
            self.rows.len(),
            self.capacity,
            self.key_column,
            self.key_type
        )?;
        for (offset, row) in self.rows.iter().enumerate() {
            writeln!(f, "  {:>4}: {}", offset, row)?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32) -> Row {
        Row::from_pairs("id", [("id", Value::Int(id))])
    }

    fn student(id: i32, name: &str) -> Row {
        Row::from_pairs("id", [("id", Value::Int(id)), ("name", Value::from(name))])
    }

    fn page(capacity: usize) -> Page {
        Page::new(PageId::new(0), capacity, "id", DataType::Int)
    }

    fn keys(page: &Page) -> Vec<i32> {
        page.rows()
            .iter()
            .map(|r| match r.key() {
                Some(Value::Int(k)) => *k,
                _ => panic!("non-int key"),
            })
            .collect()
    }

    fn predicate(pairs: &[(&str, Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_insert_sorted_orders_rows() {
        let mut page = page(5);
        for k in [5, 1, 3] {
            page.insert_sorted(row(k)).unwrap();
        }
        assert_eq!(keys(&page), vec![1, 3, 5]);
        assert_eq!(page.max_key(), Some(&Value::Int(5)));
        assert_eq!(page.find(&Value::Int(3)), Some(1));
        assert_eq!(page.find(&Value::Int(4)), None);
    }

    #[test]
    fn test_insert_reports_offset() {
        let mut page = page(5);
        page.insert_sorted(row(10)).unwrap();
        page.insert_sorted(row(30)).unwrap();

        let outcome = page.insert_sorted(row(20)).unwrap();
        assert_eq!(outcome.offset, 1);
        assert!(outcome.overflow.is_none());
    }

    #[test]
    fn test_insert_duplicate_leaves_page_unchanged() {
        let mut page = page(3);
        page.insert_sorted(row(1)).unwrap();
        page.insert_sorted(row(2)).unwrap();

        let result = page.insert_sorted(student(2, "dup"));
        assert!(matches!(result, Err(Error::DuplicateClusteringKey(_))));
        assert_eq!(keys(&page), vec![1, 2]);
        assert!(page.row_at(1).unwrap().get("name").is_none());
    }

    #[test]
    fn test_insert_missing_key() {
        let mut page = page(3);
        let keyless = Row::from_pairs("id", [("name", Value::from("x"))]);
        assert!(matches!(
            page.insert_sorted(keyless),
            Err(Error::MissingClusteringKey(_))
        ));
    }

    #[test]
    fn test_overflow_with_capacity_two() {
        let mut page = page(2);
        assert!(page.insert_sorted(row(1)).unwrap().overflow.is_none());
        assert!(page.insert_sorted(row(3)).unwrap().overflow.is_none());
        assert!(page.is_full());

        let outcome = page.insert_sorted(row(2)).unwrap();
        assert_eq!(outcome.offset, 1);
        assert_eq!(outcome.overflow, Some(row(3)));
        assert_eq!(keys(&page), vec![1, 2]);
    }

    #[test]
    fn test_update_by_key() {
        let mut page = page(3);
        page.insert_sorted(student(1, "Ali")).unwrap();

        let changes = predicate(&[("name", Value::from("Omar")), ("gpa", Value::Double(0.9))]);
        let (old, new) = page.update_by_key(&Value::Int(1), &changes).unwrap();

        assert_eq!(old.get("name"), Some(&Value::from("Ali")));
        assert_eq!(new.get("name"), Some(&Value::from("Omar")));
        assert_eq!(page.row_at(0), Some(&new));
        assert!(page.update_by_key(&Value::Int(2), &changes).is_none());
    }

    #[test]
    fn test_delete_at_checks_residual() {
        let mut page = page(3);
        page.insert_sorted(student(1, "Ali")).unwrap();
        page.insert_sorted(student(2, "Omar")).unwrap();

        let wrong = predicate(&[("name", Value::from("Zed"))]);
        assert_eq!(page.delete_at(&Value::Int(2), &wrong), None);

        let missing_column = predicate(&[("gpa", Value::Double(1.0))]);
        assert_eq!(page.delete_at(&Value::Int(2), &missing_column), None);

        let right = predicate(&[("name", Value::from("Omar"))]);
        assert_eq!(page.delete_at(&Value::Int(2), &right), Some(1));
        assert_eq!(keys(&page), vec![1]);
    }

    #[test]
    fn test_delete_all_matching_returns_original_offsets() {
        let mut page = page(5);
        for (id, name) in [(1, "a"), (2, "b"), (3, "a"), (4, "c"), (5, "a")] {
            page.insert_sorted(student(id, name)).unwrap();
        }

        let removed = page.delete_all_matching(&predicate(&[("name", Value::from("a"))]));
        assert_eq!(removed, vec![0, 2, 4]);
        assert_eq!(keys(&page), vec![2, 4]);
    }

    #[test]
    fn test_delete_all_matching_empty_predicate() {
        let mut page = page(3);
        page.insert_sorted(row(1)).unwrap();
        page.insert_sorted(row(2)).unwrap();

        assert_eq!(page.delete_all_matching(&FieldMap::new()), vec![0, 1]);
        assert!(page.is_empty());
        assert_eq!(page.max_key(), None);
    }

    #[test]
    fn test_delete_at_offsets_reverifies() {
        let mut page = page(5);
        for (id, name) in [(1, "a"), (2, "b"), (3, "a")] {
            page.insert_sorted(student(id, name)).unwrap();
        }

        let candidates: BTreeSet<usize> = [0, 1, 2, 9].into_iter().collect();
        let removed = page.delete_at_offsets(&candidates, &predicate(&[("name", Value::from("a"))]));

        assert_eq!(removed, vec![0, 2]);
        assert_eq!(keys(&page), vec![2]);
    }

    #[test]
    fn test_row_source_scoped_to_page() {
        let mut page = page(3);
        page.insert_sorted(row(7)).unwrap();

        let source: &dyn RowSource = &page;
        assert_eq!(source.resolve(PageId::new(0), 0).unwrap(), Some(row(7)));
        assert_eq!(source.resolve(PageId::new(0), 1).unwrap(), None);
        assert_eq!(source.resolve(PageId::new(1), 0).unwrap(), None);
    }

    #[test]
    fn test_display() {
        let mut page = page(2);
        page.insert_sorted(student(1, "Ali")).unwrap();

        let dump = page.to_string();
        assert!(dump.starts_with("Page(0) [1/2] key: id INT"));
        assert!(dump.contains("0: {id: 1, name: Ali}"));
    }
}
