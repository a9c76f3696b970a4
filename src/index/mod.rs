//! Secondary index structures.
//!
//! - [`grid`] - Multidimensional range-partitioned grid index

pub mod grid;

pub use grid::GridIndex;
