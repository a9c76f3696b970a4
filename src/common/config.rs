//! Configuration for gridtabledb.
//!
//! Capacities are fixed when a table is created and persisted in the table
//! root, so reopening a table never depends on the config that is loaded at
//! the time.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

/// Default maximum number of rows held by one page.
pub const DEFAULT_MAX_ROWS_PER_PAGE: usize = 200;

/// Default maximum number of references held by one index bucket.
pub const DEFAULT_MAX_REFS_PER_BUCKET: usize = 20;

/// Default number of equal-width ranges per indexed column.
///
/// A grid dimension may end up with one more range when the domain does not
/// divide evenly, plus the catch-all range for null and out-of-domain values.
pub const DEFAULT_CELLS_PER_DIMENSION: usize = 10;

/// Magic bytes carried by every persisted file.
pub const FILE_MAGIC: [u8; 4] = *b"GTDB";

/// Extension of the table root file.
pub const TABLE_FILE_EXTENSION: &str = "table";

/// Extension of page files.
pub const PAGE_FILE_EXTENSION: &str = "page";

/// Extension of bucket files.
pub const BUCKET_FILE_EXTENSION: &str = "bucket";

/// Suffix of the scratch file written before an atomic rename.
pub const TEMP_FILE_SUFFIX: &str = "tmp";

/// Storage capacities chosen at table-creation time.
///
/// # Example
/// ```
/// use gridtabledb::StorageConfig;
///
/// let config = StorageConfig::new(2, 4);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.cells_per_dimension, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Maximum number of rows in one page.
    pub max_rows_per_page: usize,

    /// Maximum number of references in one index bucket.
    pub max_refs_per_bucket: usize,

    /// Number of equal-width ranges each indexed column is split into.
    pub cells_per_dimension: usize,
}

impl StorageConfig {
    /// Create a config with the given page and bucket capacities.
    pub fn new(max_rows_per_page: usize, max_refs_per_bucket: usize) -> Self {
        Self {
            max_rows_per_page,
            max_refs_per_bucket,
            cells_per_dimension: DEFAULT_CELLS_PER_DIMENSION,
        }
    }

    /// Override the number of ranges per indexed column.
    pub fn with_cells_per_dimension(mut self, cells: usize) -> Self {
        self.cells_per_dimension = cells;
        self
    }

    /// Load a config from a JSON file.
    ///
    /// Keys missing from the file keep their defaults.
    ///
    /// # Errors
    /// - I/O errors reading the file
    /// - `Error::Codec` if the file is not valid JSON
    /// - `Error::InvalidConfig` if a capacity is zero
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: StorageConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every capacity is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_rows_per_page == 0 {
            return Err(Error::InvalidConfig(
                "max_rows_per_page must be > 0".to_string(),
            ));
        }
        if self.max_refs_per_bucket == 0 {
            return Err(Error::InvalidConfig(
                "max_refs_per_bucket must be > 0".to_string(),
            ));
        }
        if self.cells_per_dimension == 0 {
            return Err(Error::InvalidConfig(
                "cells_per_dimension must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_rows_per_page: DEFAULT_MAX_ROWS_PER_PAGE,
            max_refs_per_bucket: DEFAULT_MAX_REFS_PER_BUCKET,
            cells_per_dimension: DEFAULT_CELLS_PER_DIMENSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = StorageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_rows_per_page, 200);
        assert_eq!(config.max_refs_per_bucket, 20);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(StorageConfig::new(0, 5).validate().is_err());
        assert!(StorageConfig::new(5, 0).validate().is_err());
        assert!(StorageConfig::new(5, 5)
            .with_cells_per_dimension(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{ "max_rows_per_page": 3 }"#).unwrap();

        let config = StorageConfig::load(&path).unwrap();
        assert_eq!(config.max_rows_per_page, 3);
        assert_eq!(config.max_refs_per_bucket, DEFAULT_MAX_REFS_PER_BUCKET);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{ "max_refs_per_bucket": 0 }"#).unwrap();

        assert!(matches!(
            StorageConfig::load(&path),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            StorageConfig::load(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
