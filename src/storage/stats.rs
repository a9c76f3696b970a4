//! Disk I/O statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the [`DiskManager`](crate::storage::DiskManager).
///
/// All fields are atomic so the counters can be bumped through a shared
/// reference. We use `Ordering::Relaxed` everywhere: the counters are
/// independent and only read for reporting.
///
/// # Example
/// ```
/// use gridtabledb::StorageStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = StorageStats::new();
/// stats.files_read.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().files_read, 1);
/// ```
#[derive(Debug)]
pub struct StorageStats {
    /// Number of files read and verified.
    pub files_read: AtomicU64,

    /// Number of files written (each write is one atomic rename).
    pub files_written: AtomicU64,

    /// Number of files removed.
    pub files_removed: AtomicU64,

    /// Total bytes written, headers included.
    pub bytes_written: AtomicU64,
}

impl StorageStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            files_read: AtomicU64::new(0),
            files_written: AtomicU64::new(0),
            files_removed: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_read(&self) {
        self.files_read.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self, bytes: usize) {
        self.files_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_remove(&self) {
        self.files_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a non-atomic copy of the current counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_read: self.files_read.load(Ordering::Relaxed),
            files_written: self.files_written.load(Ordering::Relaxed),
            files_removed: self.files_removed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.files_read.store(0, Ordering::Relaxed);
        self.files_written.store(0, Ordering::Relaxed);
        self.files_removed.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
    }
}

impl Default for StorageStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of storage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub files_read: u64,
    pub files_written: u64,
    pub files_removed: u64,
    pub bytes_written: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ read: {}, written: {}, removed: {}, bytes_written: {} }}",
            self.files_read, self.files_written, self.files_removed, self.bytes_written
        )
    }
}
