//! Grid index over numeric and date columns.
//!
//! - [`ColumnPartition`] - Equal-width ranges of one column plus a catch-all
//! - [`Bucket`] - Persisted chain link of `(page, offset)` references
//! - [`GridIndex`] - The slot grid and its bucket chains

mod bucket;
mod grid_index;
mod range;

pub use bucket::{Bucket, RowRef};
pub use grid_index::{Candidates, GridIndex};
pub use range::{CellRange, ColumnPartition};
