//! Disk Manager - file I/O for one table directory.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Naming table, page and bucket files
//! - Writing whole structures atomically (temp file then rename)
//! - Verifying headers and checksums on read
//! - Removing files of deleted pages and buckets

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::common::config::{
    BUCKET_FILE_EXTENSION, PAGE_FILE_EXTENSION, TABLE_FILE_EXTENSION, TEMP_FILE_SUFFIX,
};
use crate::common::{BucketId, Error, IndexId, PageId, Result};
use crate::storage::file_header::{FileHeader, FileKind};
use crate::storage::page::Page;
use crate::storage::row::{Row, RowSource};
use crate::storage::stats::{StatsSnapshot, StorageStats};

/// Manages the files of a single table.
///
/// # Directory Layout
/// Every table lives in its own directory under the database root:
/// ```text
/// <root>/<table>/
/// ├── <table>.table                  table root (schema, pages, indices)
/// ├── <table>_0.page                 one file per page
/// ├── <table>_1.page
/// └── index_0_bucket_0.bucket        one file per index bucket
/// ```
///
/// # File Format
/// ```text
/// ┌──────────────────┬──────────────────────────────┐
/// │ FileHeader (13B) │ JSON payload (payload_len B) │
/// └──────────────────┴──────────────────────────────┘
/// ```
///
/// # Durability
/// Every write goes to `<file>.tmp`, is `fsync`ed, then renamed over the
/// destination, so a crash leaves either the old or the new file.
#[derive(Debug)]
pub struct DiskManager {
    dir: PathBuf,
    table_name: String,
    stats: StorageStats,
}

impl DiskManager {
    /// Create the directory for a new table.
    ///
    /// # Errors
    /// Returns `Error::TableExists` if the table root file already exists.
    pub fn create<P: AsRef<Path>>(root: P, table_name: &str) -> Result<Self> {
        let manager = Self::new(root.as_ref(), table_name);
        if manager.table_path().exists() {
            return Err(Error::TableExists(table_name.to_string()));
        }
        fs::create_dir_all(&manager.dir)?;
        Ok(manager)
    }

    /// Open the directory of an existing table.
    ///
    /// # Errors
    /// Returns `Error::TableNotFound` if the table root file doesn't exist.
    pub fn open<P: AsRef<Path>>(root: P, table_name: &str) -> Result<Self> {
        let manager = Self::new(root.as_ref(), table_name);
        if !manager.table_path().exists() {
            return Err(Error::TableNotFound(table_name.to_string()));
        }
        Ok(manager)
    }

    fn new(root: &Path, table_name: &str) -> Self {
        Self {
            dir: root.join(table_name),
            table_name: table_name.to_string(),
            stats: StorageStats::new(),
        }
    }

    // ========================================================================
    // PATHS
    // ========================================================================

    /// Directory holding every file of this table.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name of the table this manager serves.
    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// `<table>.table`
    pub fn table_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.table_name, TABLE_FILE_EXTENSION))
    }

    /// `<table>_<seq>.page`
    pub fn page_path(&self, page_id: PageId) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.{}",
            self.table_name, page_id.0, PAGE_FILE_EXTENSION
        ))
    }

    /// `index_<indexId>_bucket_<seq>.bucket`
    pub fn bucket_path(&self, index_id: IndexId, bucket_id: BucketId) -> PathBuf {
        self.dir.join(format!(
            "index_{}_bucket_{}.{}",
            index_id.0, bucket_id.0, BUCKET_FILE_EXTENSION
        ))
    }

    /// Whether the file for `page_id` exists.
    pub fn page_exists(&self, page_id: PageId) -> bool {
        self.page_path(page_id).exists()
    }

    // ========================================================================
    // GENERIC I/O
    // ========================================================================

    /// Read and verify a file, then decode its payload.
    ///
    /// # Errors
    /// - I/O errors (including `NotFound`)
    /// - `Error::Corrupted` on a short file, bad magic, wrong kind, length
    ///   mismatch or checksum mismatch
    /// - `Error::Codec` if the payload doesn't decode as `T`
    pub fn read<T: DeserializeOwned>(&self, kind: FileKind, path: &Path) -> Result<T> {
        let bytes = fs::read(path)?;
        let corrupted = |reason: &str| Error::Corrupted {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if bytes.len() < FileHeader::SIZE {
            return Err(corrupted("file shorter than header"));
        }
        let header = FileHeader::from_bytes(&bytes);
        if !header.has_valid_magic() {
            return Err(corrupted("bad magic"));
        }
        if header.kind != kind {
            return Err(corrupted("unexpected file kind"));
        }
        let payload = &bytes[FileHeader::SIZE..];
        if payload.len() != header.payload_len as usize {
            return Err(corrupted("payload length mismatch"));
        }
        if !header.verify_checksum(payload) {
            return Err(corrupted("checksum mismatch"));
        }

        self.stats.record_read();
        trace!(path = %path.display(), "read file");
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encode `value` and atomically replace the file at `path`.
    ///
    /// # Durability
    /// The temp file is `fsync`ed before the rename.
    pub fn write<T: Serialize>(&self, kind: FileKind, path: &Path, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        let header = FileHeader::new(kind, &payload);

        let mut bytes = vec![0u8; FileHeader::SIZE];
        header.write_to(&mut bytes);
        bytes.extend_from_slice(&payload);

        let tmp = temp_path(path);
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;

        self.stats.record_write(bytes.len());
        trace!(path = %path.display(), bytes = bytes.len(), "wrote file");
        Ok(())
    }

    /// Remove a file. A file that is already gone is not an error.
    pub fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                self.stats.record_remove();
                trace!(path = %path.display(), "removed file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // ========================================================================
    // PAGES
    // ========================================================================

    /// Read a page from disk.
    pub fn read_page(&self, page_id: PageId) -> Result<Page> {
        self.read(FileKind::Page, &self.page_path(page_id))
    }

    /// Write a page to disk.
    pub fn write_page(&self, page: &Page) -> Result<()> {
        self.write(FileKind::Page, &self.page_path(page.id()), page)
    }

    /// Remove a page file.
    pub fn remove_page(&self, page_id: PageId) -> Result<()> {
        self.remove(&self.page_path(page_id))
    }

    /// Snapshot of the I/O counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl RowSource for DiskManager {
    fn resolve(&self, page: PageId, offset: usize) -> Result<Option<Row>> {
        match self.read_page(page) {
            Ok(page) => Ok(page.into_rows().into_iter().nth(offset)),
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}
