//! Error types for gridtabledb.

use std::path::PathBuf;

use gridtabledb_core::{DataType, ValueError};
use thiserror::Error;

use crate::common::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in gridtabledb.
///
/// Structural errors (`DuplicateClusteringKey`, `ClusteringKeyNotFound`,
/// `ClusteringKeyImmutable`) are detected before anything is written, so the
/// table is unchanged when they are returned. I/O failures are always
/// surfaced to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted structure could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A literal could not be turned into a typed value.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// A file on disk failed its header or checksum verification.
    #[error("corrupted file {}: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },

    /// Insert rejected: the clustering key is already present.
    #[error("a row with clustering key `{0}` already exists")]
    DuplicateClusteringKey(String),

    /// No row carries the requested clustering key.
    #[error("no row with clustering key `{0}`")]
    ClusteringKeyNotFound(String),

    /// Update attempted to change the clustering-key column.
    #[error("clustering key column `{0}` cannot be updated")]
    ClusteringKeyImmutable(String),

    /// Inserted row does not carry the clustering-key column.
    #[error("row is missing clustering key column `{0}`")]
    MissingClusteringKey(String),

    /// An overflow cascade needed a destination page that does not exist.
    ///
    /// This indicates a bug in the engine, never bad input.
    #[error("internal engine error: offset {offset} of {page} overflowed but no overflow page exists")]
    EngineInternalOverflow { page: PageId, offset: usize },

    /// A double that is NaN or infinite cannot be persisted.
    #[error("column `{0}` holds a non-finite double")]
    NonFiniteValue(String),

    /// A column name is not part of the table.
    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    /// A grid index was requested over a column it cannot partition.
    #[error("column `{column}` of type {data_type} cannot be indexed")]
    UnsupportedIndexColumn { column: String, data_type: DataType },

    /// An index definition is malformed (empty or repeated columns).
    #[error("invalid index: {0}")]
    InvalidIndex(String),

    /// A table schema is malformed.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A storage configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A table with this name already exists under the root directory.
    #[error("table `{0}` already exists")]
    TableExists(String),

    /// No table with this name exists under the root directory.
    #[error("table `{0}` not found")]
    TableNotFound(String),

    /// A select combinator other than AND / OR.
    #[error("invalid combinator `{0}`, expected AND or OR")]
    InvalidCombinator(String),

    /// A select operator outside `=, !=, <, >, <=, >=`.
    #[error("invalid operator `{0}`")]
    InvalidOperator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicateClusteringKey("42".to_string());
        assert_eq!(
            format!("{}", err),
            "a row with clustering key `42` already exists"
        );

        let err = Error::EngineInternalOverflow {
            page: PageId::new(3),
            offset: 2,
        };
        assert_eq!(
            format!("{}", err),
            "internal engine error: offset 2 of Page(3) overflowed but no overflow page exists"
        );

        let err = Error::NonFiniteValue("gpa".to_string());
        assert_eq!(format!("{}", err), "column `gpa` holds a non-finite double");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::from(io_err);
        assert!(err.source().is_some());
        assert!(Error::UnknownColumn("x".to_string()).source().is_none());
    }

    #[test]
    fn test_result_type_alias() {
        fn might_fail() -> Result<u32> {
            Ok(42)
        }

        assert_eq!(might_fail().unwrap(), 42);
    }
}
