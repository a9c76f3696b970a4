//! Buckets - persisted lists of row references.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{BucketId, Error, IndexId, PageId, Result};
use crate::storage::{DiskManager, FieldMap, FileKind, RowSource};

/// Location of a row: page and offset within the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowRef {
    pub page: PageId,
    pub offset: usize,
}

impl RowRef {
    pub fn new(page: PageId, offset: usize) -> Self {
        Self { page, offset }
    }
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page, self.offset)
    }
}

/// A capacity-bounded list of [`RowRef`]s owned by one grid slot.
///
/// The bucket itself never touches disk on mutation; the owning
/// [`GridIndex`](super::GridIndex) saves it after every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    index: IndexId,
    id: BucketId,
    capacity: usize,
    refs: Vec<RowRef>,
}

impl Bucket {
    pub fn new(index: IndexId, id: BucketId, capacity: usize) -> Self {
        Self {
            index,
            id,
            capacity,
            refs: Vec::with_capacity(capacity),
        }
    }

    /// Load a bucket from its file.
    pub fn load(disk: &DiskManager, index: IndexId, id: BucketId) -> Result<Self> {
        disk.read(FileKind::Bucket, &disk.bucket_path(index, id))
    }

    /// Write this bucket to its file.
    pub fn save(&self, disk: &DiskManager) -> Result<()> {
        disk.write(FileKind::Bucket, &disk.bucket_path(self.index, self.id), self)
    }

    /// Remove this bucket's file.
    pub fn drop_file(&self, disk: &DiskManager) -> Result<()> {
        disk.remove(&disk.bucket_path(self.index, self.id))
    }

    #[inline]
    pub fn id(&self) -> BucketId {
        self.id
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.refs.len() >= self.capacity
    }

    #[inline]
    pub fn refs(&self) -> &[RowRef] {
        &self.refs
    }

    /// Append a reference. Capacity is the caller's concern.
    pub fn insert(&mut self, row_ref: RowRef) {
        self.refs.push(row_ref);
    }

    /// Remove the first reference whose row matches every field of
    /// `predicate`.
    ///
    /// Returns whether a reference was removed.
    pub fn remove(&mut self, predicate: &FieldMap, rows: &dyn RowSource) -> Result<bool> {
        for i in 0..self.refs.len() {
            let RowRef { page, offset } = self.refs[i];
            if let Some(row) = rows.resolve(page, offset)? {
                if row.matches_all(predicate) {
                    self.refs.remove(i);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Shift references on `page` at or past `threshold` one slot down.
    ///
    /// A reference pushed to `capacity` moves to `(overflow, 0)`. Returns
    /// whether anything changed.
    ///
    /// # Errors
    /// `Error::EngineInternalOverflow` if a reference would reach `capacity`
    /// and there is no overflow page. The bucket is unchanged in that case.
    pub fn increment(
        &mut self,
        page: PageId,
        threshold: usize,
        overflow: Option<PageId>,
        capacity: usize,
    ) -> Result<bool> {
        if overflow.is_none() {
            if let Some(r) = self
                .refs
                .iter()
                .find(|r| r.page == page && r.offset >= threshold && r.offset + 1 >= capacity)
            {
                return Err(Error::EngineInternalOverflow {
                    page,
                    offset: r.offset,
                });
            }
        }

        let mut changed = false;
        for r in self.refs.iter_mut() {
            if r.page != page || r.offset < threshold {
                continue;
            }
            changed = true;
            r.offset += 1;
            if r.offset >= capacity {
                if let Some(target) = overflow {
                    *r = RowRef::new(target, 0);
                }
            }
        }
        Ok(changed)
    }

    /// Drop references to deleted rows and close the gaps they left.
    ///
    /// `deleted` maps each page to the offsets removed from it, as they were
    /// before the removal. Returns whether anything changed.
    pub fn delete(&mut self, deleted: &BTreeMap<PageId, BTreeSet<usize>>) -> bool {
        let before = self.refs.clone();
        self.refs.retain(|r| {
            deleted
                .get(&r.page)
                .map_or(true, |offsets| !offsets.contains(&r.offset))
        });
        for r in self.refs.iter_mut() {
            if let Some(offsets) = deleted.get(&r.page) {
                r.offset -= offsets.range(..r.offset).count();
            }
        }
        self.refs != before
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} [{}/{}]:",
            self.id,
            self.index,
            self.refs.len(),
            self.capacity
        )?;
        for r in &self.refs {
            write!(f, " {}", r)?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
