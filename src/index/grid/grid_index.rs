//! GridIndex - a multidimensional range partition over row references.
//!
//! Each indexed column is split into ranges by a [`ColumnPartition`]. A
//! combination of one range per column is a *slot*; the slots form a grid
//! whose size is the product of the per-column range counts. Slots are
//! numbered in mixed radix with the first declared column least significant:
//!
//! ```text
//! columns (a, b), a has 3 ranges, b has 2:
//!
//!            a=0  a=1  a=2
//!   b=0       0    1    2
//!   b=1       3    4    5
//! ```
//!
//! Each slot owns a chain of [`Bucket`]s holding `(page, offset)` references.
//! The index only stores bucket ids, and only for slots that hold at least one
//! bucket; bucket contents live in their own files and are loaded per
//! operation.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use gridtabledb_core::{ColumnDescriptor, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::{BucketId, Error, IndexId, PageId, Result};
use crate::index::grid::bucket::{Bucket, RowRef};
use crate::index::grid::range::ColumnPartition;
use crate::storage::{DiskManager, FieldMap, Row, RowSource};

/// Candidate row locations grouped by page.
pub type Candidates = BTreeMap<PageId, BTreeSet<usize>>;

/// A grid index over one or more numeric or date columns.
///
/// The index metadata (partitions, slot chains, bucket counter) is persisted
/// as part of the table root, so every mutation here must be followed by a
/// save of the owning table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridIndex {
    id: IndexId,
    partitions: Vec<ColumnPartition>,
    slot_count: usize,
    slots: BTreeMap<usize, Vec<BucketId>>,
    bucket_capacity: usize,
    next_bucket: u32,
}

impl GridIndex {
    /// Build an empty index over `columns`, in declaration order.
    ///
    /// # Errors
    /// - `Error::InvalidIndex` for an empty or repeated column list, or a grid
    ///   with more slots than `usize` can number
    /// - `Error::UnsupportedIndexColumn` for text columns
    pub fn new(
        id: IndexId,
        columns: &[ColumnDescriptor],
        cells_per_dimension: usize,
        bucket_capacity: usize,
    ) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::InvalidIndex("no columns given".to_string()));
        }
        let mut seen = HashSet::new();
        for column in columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::InvalidIndex(format!(
                    "column `{}` listed twice",
                    column.name
                )));
            }
        }

        let partitions = columns
            .iter()
            .map(|c| ColumnPartition::build(c, cells_per_dimension))
            .collect::<Result<Vec<_>>>()?;
        let slot_count = partitions
            .iter()
            .try_fold(1usize, |acc, p| acc.checked_mul(p.len()))
            .ok_or_else(|| {
                Error::InvalidIndex(format!("grid over {} columns is too large", partitions.len()))
            })?;

        Ok(Self {
            id,
            partitions,
            slot_count,
            slots: BTreeMap::new(),
            bucket_capacity,
            next_bucket: 0,
        })
    }

    // ========================================================================
    // READERS
    // ========================================================================

    #[inline]
    pub fn id(&self) -> IndexId {
        self.id
    }

    /// Indexed column names, in declaration order.
    pub fn columns(&self) -> Vec<&str> {
        self.partitions.iter().map(ColumnPartition::column).collect()
    }

    pub fn partitions(&self) -> &[ColumnPartition] {
        &self.partitions
    }

    pub fn covers(&self, column: &str) -> bool {
        self.partitions.iter().any(|p| p.column() == column)
    }

    /// Number of indexed columns that appear in `predicate`.
    pub fn overlap(&self, predicate: &FieldMap) -> usize {
        self.partitions
            .iter()
            .filter(|p| predicate.contains_key(p.column()))
            .count()
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Number of slots holding at least one bucket.
    pub fn occupied_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of buckets across all slots.
    pub fn bucket_count(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    /// Bucket chain of one slot.
    pub fn chain(&self, slot: usize) -> &[BucketId] {
        self.slots.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Range of `column` that `value` falls in.
    pub fn cell_of(&self, column: &str, value: Option<&Value>) -> Option<usize> {
        self.partitions
            .iter()
            .find(|p| p.column() == column)
            .map(|p| p.cell_of(value))
    }

    /// Slot of a row, given its field values. Absent columns are null.
    pub fn slot_of(&self, fields: &FieldMap) -> usize {
        let mut slot = 0;
        let mut stride = 1;
        for p in &self.partitions {
            slot += p.cell_of(fields.get(p.column())) * stride;
            stride *= p.len();
        }
        slot
    }

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    /// Reference `(page, offset)` under the slot of `row`.
    ///
    /// Uses the first bucket of the chain with room, or starts a new one.
    pub fn insert(&mut self, disk: &DiskManager, row: &Row, page: PageId, offset: usize) -> Result<()> {
        let slot = self.slot_of(row.fields());
        let row_ref = RowRef::new(page, offset);

        for &bucket_id in self.chain(slot) {
            let mut bucket = Bucket::load(disk, self.id, bucket_id)?;
            if !bucket.is_full() {
                bucket.insert(row_ref);
                return bucket.save(disk);
            }
        }

        let bucket_id = BucketId::new(self.next_bucket);
        self.next_bucket += 1;
        let mut bucket = Bucket::new(self.id, bucket_id, self.bucket_capacity);
        bucket.insert(row_ref);
        bucket.save(disk)?;
        self.slots.entry(slot).or_default().push(bucket_id);
        debug!(index = %self.id, bucket = %bucket_id, slot, "created bucket");
        Ok(())
    }

    /// Remove the reference to the row described by `predicate`.
    ///
    /// The slot is computed from `predicate`, so it must carry the row's
    /// values for every indexed column. Returns whether a reference was
    /// removed.
    pub fn remove(&mut self, disk: &DiskManager, predicate: &FieldMap, rows: &dyn RowSource) -> Result<bool> {
        let slot = self.slot_of(predicate);
        let chain = self.chain(slot).to_vec();

        for (i, bucket_id) in chain.into_iter().enumerate() {
            let mut bucket = Bucket::load(disk, self.id, bucket_id)?;
            if !bucket.remove(predicate, rows)? {
                continue;
            }
            if bucket.is_empty() {
                bucket.drop_file(disk)?;
                if let Some(chain) = self.slots.get_mut(&slot) {
                    chain.remove(i);
                    if chain.is_empty() {
                        self.slots.remove(&slot);
                    }
                }
                debug!(index = %self.id, bucket = %bucket_id, slot, "dropped empty bucket");
            } else {
                bucket.save(disk)?;
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Shift references after an insertion at `threshold` of `page`.
    ///
    /// See [`Bucket::increment`].
    pub fn increment(
        &mut self,
        disk: &DiskManager,
        page: PageId,
        threshold: usize,
        overflow: Option<PageId>,
        capacity: usize,
    ) -> Result<()> {
        for chain in self.slots.values() {
            for &bucket_id in chain {
                let mut bucket = Bucket::load(disk, self.id, bucket_id)?;
                if bucket.increment(page, threshold, overflow, capacity)? {
                    bucket.save(disk)?;
                }
            }
        }
        Ok(())
    }

    /// Drop references to deleted rows and compact the survivors.
    ///
    /// See [`Bucket::delete`]. Buckets left empty are removed.
    pub fn delete(&mut self, disk: &DiskManager, deleted: &Candidates) -> Result<()> {
        if deleted.is_empty() {
            return Ok(());
        }
        let id = self.id;
        for (&slot, chain) in self.slots.iter_mut() {
            let mut kept = Vec::with_capacity(chain.len());
            for &bucket_id in chain.iter() {
                let mut bucket = Bucket::load(disk, id, bucket_id)?;
                if !bucket.delete(deleted) {
                    kept.push(bucket_id);
                } else if bucket.is_empty() {
                    bucket.drop_file(disk)?;
                    debug!(index = %id, bucket = %bucket_id, slot, "dropped empty bucket");
                } else {
                    bucket.save(disk)?;
                    kept.push(bucket_id);
                }
            }
            *chain = kept;
        }
        self.slots.retain(|_, chain| !chain.is_empty());
        Ok(())
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Candidate locations for rows matching `predicate`.
    ///
    /// Columns named in `predicate` restrict their dimension to one range;
    /// the rest match every range. Candidates are a superset of the matching
    /// rows, so callers re-check the predicate.
    pub fn lookup(&self, disk: &DiskManager, predicate: &FieldMap) -> Result<Candidates> {
        if self.overlap(predicate) == 0 {
            warn!(index = %self.id, "lookup constrains no indexed column, scanning the whole grid");
        }

        let wanted: Vec<Option<usize>> = self
            .partitions
            .iter()
            .map(|p| predicate.get(p.column()).map(|value| p.cell_of(Some(value))))
            .collect();

        let mut candidates = Candidates::new();
        for (&slot, chain) in &self.slots {
            if !self.slot_matches(slot, &wanted) {
                continue;
            }
            for &bucket_id in chain {
                let bucket = Bucket::load(disk, self.id, bucket_id)?;
                for r in bucket.refs() {
                    candidates.entry(r.page).or_default().insert(r.offset);
                }
            }
        }
        Ok(candidates)
    }

    /// Every live reference with its slot.
    pub fn references(&self, disk: &DiskManager) -> Result<Vec<(usize, RowRef)>> {
        let mut out = Vec::new();
        for (&slot, chain) in &self.slots {
            for &bucket_id in chain {
                let bucket = Bucket::load(disk, self.id, bucket_id)?;
                out.extend(bucket.refs().iter().map(|r| (slot, *r)));
            }
        }
        Ok(out)
    }

    /// Whether `slot` lies in the wanted cell of every constrained column.
    fn slot_matches(&self, mut slot: usize, wanted: &[Option<usize>]) -> bool {
        for (p, want) in self.partitions.iter().zip(wanted) {
            let cell = slot % p.len();
            slot /= p.len();
            if want.is_some_and(|w| w != cell) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} on [{}] ({} slots, {} buckets)",
            self.id,
            self.columns().join(", "),
            self.slot_count,
            self.bucket_count()
        )?;
        for p in &self.partitions {
            writeln!(f, "  {}", p)?;
        }
        for (slot, chain) in &self.slots {
            let ids: Vec<String> = chain.iter().map(ToString::to_string).collect();
            writeln!(f, "  slot {}: {}", slot, ids.join(" -> "))?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
