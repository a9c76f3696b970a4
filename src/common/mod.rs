//! Common types and utilities shared across gridtabledb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration ([`config::StorageConfig`] and file-format constants)
//! - Error types
//! - Identifiers (PageId, BucketId, IndexId)

pub mod config;
pub mod error;
mod bucket_id;
mod page_id;

pub use bucket_id::{BucketId, IndexId};
pub use config::StorageConfig;
pub use error::{Error, Result};
pub use page_id::PageId;
