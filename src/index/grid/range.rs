//! Per-column range partitions.
//!
//! Every indexed column splits its `[min, max]` domain into equal-width,
//! half-open ranges. The last bounded range is closed on `max`. One trailing
//! catch-all range collects nulls and values outside the domain, so every
//! value maps to exactly one range.
//!
//! ```text
//! INT [0, 100], 10 cells:
//!
//!   [0,10) [10,20) [20,30) ... [80,90) [90,100] | *
//!     0       1       2          8        9       10
//! ```

use std::fmt;

use gridtabledb_core::{ColumnDescriptor, DataType, Date, Value};
use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

/// One range of a [`ColumnPartition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellRange {
    /// `[lower, upper)`, or `[lower, upper]` when `closed`.
    Bounded {
        lower: Value,
        upper: Value,
        closed: bool,
    },
    /// Nulls and out-of-domain values.
    CatchAll,
}

impl CellRange {
    fn bounded(lower: Value, upper: Value) -> Self {
        CellRange::Bounded {
            lower,
            upper,
            closed: false,
        }
    }

    fn closed(lower: Value, upper: Value) -> Self {
        CellRange::Bounded {
            lower,
            upper,
            closed: true,
        }
    }

    /// Whether `value` falls in this range. Only the catch-all holds null.
    pub fn contains(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (CellRange::CatchAll, _) => true,
            (CellRange::Bounded { .. }, None) => false,
            (
                CellRange::Bounded {
                    lower,
                    upper,
                    closed,
                },
                Some(v),
            ) => lower <= v && (v < upper || (*closed && v == upper)),
        }
    }

    fn lower(&self) -> Option<&Value> {
        match self {
            CellRange::Bounded { lower, .. } => Some(lower),
            CellRange::CatchAll => None,
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRange::Bounded {
                lower,
                upper,
                closed,
            } => write!(f, "[{}, {}{}", lower, upper, if *closed { "]" } else { ")" }),
            CellRange::CatchAll => write!(f, "*"),
        }
    }
}

/// The ranges of one indexed column.
///
/// # Example
/// ```
/// use gridtabledb::index::grid::ColumnPartition;
/// use gridtabledb_core::{ColumnDescriptor, DataType, Value};
///
/// let age = ColumnDescriptor::new("age", DataType::Int, Value::Int(0), Value::Int(100));
/// let partition = ColumnPartition::build(&age, 10).unwrap();
///
/// assert_eq!(partition.len(), 11); // ten ranges plus the catch-all
/// assert_eq!(partition.cell_of(Some(&Value::Int(55))), 5);
/// assert_eq!(partition.cell_of(Some(&Value::Int(100))), 9);
/// assert_eq!(partition.cell_of(None), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPartition {
    column: String,
    data_type: DataType,
    ranges: Vec<CellRange>,
}

impl ColumnPartition {
    /// Split the column's `[min, max]` domain into `cells` ranges.
    ///
    /// # Errors
    /// - `Error::UnsupportedIndexColumn` for text columns
    /// - `Error::InvalidIndex` if `cells` is zero or the bounds don't carry
    ///   the column's type
    pub fn build(column: &ColumnDescriptor, cells: usize) -> Result<Self> {
        if !column.data_type.is_indexable() {
            return Err(Error::UnsupportedIndexColumn {
                column: column.name.clone(),
                data_type: column.data_type,
            });
        }
        if cells == 0 {
            return Err(Error::InvalidIndex(format!(
                "column `{}` needs at least one cell",
                column.name
            )));
        }

        let mut ranges = match (&column.min, &column.max) {
            (Value::Int(min), Value::Int(max)) => {
                integral_ranges(*min as i64, *max as i64, cells, |v| Value::Int(v as i32))
            }
            (Value::Date(min), Value::Date(max)) => integral_ranges(
                min.days() as i64,
                max.days() as i64,
                cells,
                |v| Value::Date(Date::new(v as i32)),
            ),
            (Value::Double(min), Value::Double(max)) => double_ranges(*min, *max, cells),
            _ => {
                return Err(Error::InvalidIndex(format!(
                    "bounds of column `{}` are not {}",
                    column.name, column.data_type
                )))
            }
        };
        ranges.push(CellRange::CatchAll);

        Ok(Self {
            column: column.name.clone(),
            data_type: column.data_type,
            ranges,
        })
    }

    #[inline]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of ranges, catch-all included.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Always false: the catch-all is always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Position of the catch-all range.
    #[inline]
    pub fn catch_all(&self) -> usize {
        self.ranges.len() - 1
    }

    pub fn range(&self, cell: usize) -> Option<&CellRange> {
        self.ranges.get(cell)
    }

    pub fn ranges(&self) -> &[CellRange] {
        &self.ranges
    }

    /// The range a value belongs to.
    pub fn cell_of(&self, value: Option<&Value>) -> usize {
        let catch_all = self.catch_all();
        let value = match value {
            Some(v) if v.data_type() == self.data_type => v,
            _ => return catch_all,
        };

        let bounded = &self.ranges[..catch_all];
        let after = bounded.partition_point(|r| r.lower().map_or(false, |lower| lower <= value));
        match after.checked_sub(1) {
            Some(cell) if bounded[cell].contains(Some(value)) => cell,
            _ => catch_all,
        }
    }
}

impl fmt::Display for ColumnPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:", self.column, self.data_type)?;
        for range in &self.ranges {
            write!(f, " {}", range)?;
        }
        Ok(())
    }
}

/// Ranges of integral width over `[min, max]`.
///
/// A span that doesn't divide evenly gets one extra range `[last end, max]`.
fn integral_ranges(min: i64, max: i64, cells: usize, make: impl Fn(i64) -> Value) -> Vec<CellRange> {
    let span = max - min;
    if span <= 0 {
        return vec![CellRange::closed(make(min), make(max))];
    }

    let n = (cells as i64).min(span);
    let step = span / n;
    let mut ranges: Vec<CellRange> = (0..n)
        .map(|i| CellRange::bounded(make(min + i * step), make(min + (i + 1) * step)))
        .collect();

    let end = min + n * step;
    if end < max {
        ranges.push(CellRange::closed(make(end), make(max)));
    } else if let Some(CellRange::Bounded { closed, .. }) = ranges.last_mut() {
        *closed = true;
    }
    ranges
}

fn double_ranges(min: f64, max: f64, cells: usize) -> Vec<CellRange> {
    let span = max - min;
    if span.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
        return vec![CellRange::closed(Value::Double(min), Value::Double(max))];
    }

    let step = span / cells as f64;
    (0..cells)
        .map(|i| {
            let lower = min + i as f64 * step;
            if i + 1 == cells {
                CellRange::closed(Value::Double(lower), Value::Double(max))
            } else {
                CellRange::bounded(Value::Double(lower), Value::Double(min + (i + 1) as f64 * step))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_column(min: i32, max: i32) -> ColumnDescriptor {
        ColumnDescriptor::new("age", DataType::Int, Value::Int(min), Value::Int(max))
    }

    #[test]
    fn test_int_ten_cells() {
        let p = ColumnPartition::build(&int_column(0, 100), 10).unwrap();
        assert_eq!(p.len(), 11);
        assert_eq!(p.cell_of(Some(&Value::Int(0))), 0);
        assert_eq!(p.cell_of(Some(&Value::Int(9))), 0);
        assert_eq!(p.cell_of(Some(&Value::Int(10))), 1);
        assert_eq!(p.cell_of(Some(&Value::Int(55))), 5);
        assert_eq!(p.cell_of(Some(&Value::Int(100))), 9);
    }

    #[test]
    fn test_int_remainder_adds_range() {
        let p = ColumnPartition::build(&int_column(0, 105), 10).unwrap();
        assert_eq!(p.len(), 12);
        assert_eq!(p.cell_of(Some(&Value::Int(99))), 9);
        assert_eq!(p.cell_of(Some(&Value::Int(100))), 10);
        assert_eq!(p.cell_of(Some(&Value::Int(105))), 10);
    }

    #[test]
    fn test_narrow_int_domain() {
        let p = ColumnPartition::build(&int_column(1, 4), 10).unwrap();
        // span 3 gives three unit ranges, the last closed on 4
        assert_eq!(p.len(), 4);
        assert_eq!(p.cell_of(Some(&Value::Int(3))), 2);
        assert_eq!(p.cell_of(Some(&Value::Int(4))), 2);

        let single = ColumnPartition::build(&int_column(7, 7), 10).unwrap();
        assert_eq!(single.len(), 2);
        assert_eq!(single.cell_of(Some(&Value::Int(7))), 0);
        assert_eq!(single.cell_of(Some(&Value::Int(8))), 1);
    }

    #[test]
    fn test_out_of_domain_and_null() {
        let p = ColumnPartition::build(&int_column(0, 100), 10).unwrap();
        assert_eq!(p.cell_of(Some(&Value::Int(-1))), p.catch_all());
        assert_eq!(p.cell_of(Some(&Value::Int(101))), p.catch_all());
        assert_eq!(p.cell_of(None), p.catch_all());
        assert_eq!(p.cell_of(Some(&Value::Double(5.0))), p.catch_all());
    }

    #[test]
    fn test_double_ranges() {
        let gpa = ColumnDescriptor::new("gpa", DataType::Double, Value::Double(0.0), Value::Double(5.0));
        let p = ColumnPartition::build(&gpa, 5).unwrap();
        assert_eq!(p.len(), 6);
        assert_eq!(p.cell_of(Some(&Value::Double(0.0))), 0);
        assert_eq!(p.cell_of(Some(&Value::Double(0.99))), 0);
        assert_eq!(p.cell_of(Some(&Value::Double(1.0))), 1);
        assert_eq!(p.cell_of(Some(&Value::Double(5.0))), 4);
        assert_eq!(p.cell_of(Some(&Value::Double(5.01))), 5);
    }

    #[test]
    fn test_date_ranges() {
        let start = Date::from_ymd(2000, 1, 1).unwrap();
        let end = Date::new(start.days() + 100);
        let column = ColumnDescriptor::new("dob", DataType::Date, Value::Date(start), Value::Date(end));
        let p = ColumnPartition::build(&column, 10).unwrap();

        assert_eq!(p.len(), 11);
        assert_eq!(p.cell_of(Some(&Value::Date(Date::new(start.days() + 25)))), 2);
        assert_eq!(p.cell_of(Some(&Value::Date(end))), 9);
    }

    #[test]
    fn test_text_rejected() {
        let name = ColumnDescriptor::new("name", DataType::Text, Value::from("A"), Value::from("Z"));
        assert!(matches!(
            ColumnPartition::build(&name, 10),
            Err(Error::UnsupportedIndexColumn { .. })
        ));
    }

    #[test]
    fn test_display() {
        let p = ColumnPartition::build(&int_column(0, 4), 2).unwrap();
        assert_eq!(p.to_string(), "age INT: [0, 2) [2, 4] *");
    }
}
