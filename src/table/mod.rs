//! Tables - the orchestration layer.
//!
//! - [`Table`] - Pages, max-key cache and grid indices of one table
//! - [`TableSchema`] / [`Catalog`] - Column descriptors and where they come from
//! - [`SelectTerm`] / [`SelectIter`] - Filtered, lazy row scans

mod schema;
mod select;
#[allow(clippy::module_inception)]
mod table;

pub use schema::{Catalog, TableSchema};
pub use select::{matches, Combinator, Operator, SelectIter, SelectTerm};
pub use table::Table;
