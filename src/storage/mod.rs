//! Storage layer - files, rows and pages.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Per-table file I/O with atomic rewrites
//! - [`FileHeader`] - Header and checksum carried by every file
//! - [`Row`] - A typed field mapping with a clustering key
//! - [`page`] - Key-sorted pages of rows
//! - [`StorageStats`] - I/O counters

mod disk_manager;
mod file_header;
pub mod page;
mod row;
mod stats;

pub use disk_manager::DiskManager;
pub use file_header::{FileHeader, FileKind};
pub use row::{FieldMap, Row, RowSource};
pub use stats::{StatsSnapshot, StorageStats};
