//! Pages of rows.
//!
//! This module contains:
//! - [`Page`] - A capacity-bounded, key-sorted run of rows
//! - [`InsertOutcome`] - Where an insert landed and what it evicted

#[allow(clippy::module_inception)]
mod page;

pub use page::{InsertOutcome, Page};
