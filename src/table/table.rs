//! Table - ordered pages of rows plus their grid indices.
//!
//! The table root keeps, per page in key order, the page id and the page's
//! maximum clustering key. Locating the page for a key is a binary search over
//! that max-key cache:
//!
//! ```text
//!  pages:     Page(0)   Page(3)   Page(1)   Page(2)
//!  max_keys:     12        40        41        97
//!
//!  key 35 -> first max >= 35 -> Page(3)
//!  key 99 -> none            -> append to the last page (or a new one)
//! ```
//!
//! Rows move when a full page overflows: its last row cascades into the next
//! page if that page has room, otherwise into a freshly allocated page. Every
//! move is reported to each [`GridIndex`] through `increment` (insertions) and
//! `delete` (removals) so bucket references always point at their row.

use std::path::Path;

use gridtabledb_core::Value;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::common::{Error, IndexId, PageId, Result, StorageConfig};
use crate::index::grid::{Candidates, GridIndex, RowRef};
use crate::storage::page::Page;
use crate::storage::{DiskManager, FieldMap, FileKind, Row, StatsSnapshot};
use crate::table::schema::{Catalog, TableSchema};
use crate::table::select::{Combinator, SelectIter, SelectTerm};

/// Everything persisted in the table root file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableState {
    schema: TableSchema,
    config: StorageConfig,
    pages: Vec<PageId>,
    max_keys: Vec<Value>,
    indices: Vec<GridIndex>,
    next_page: u32,
    next_index: u32,
}

/// A clustering-key ordered table.
///
/// Only the root state lives in memory; pages and buckets are loaded per
/// call and written back before the call returns.
///
/// # Example
/// ```no_run
/// use gridtabledb::{Row, StorageConfig, Table};
/// use gridtabledb::table::TableSchema;
/// use gridtabledb_core::{ColumnDescriptor, DataType, Value};
///
/// let schema = TableSchema::new(
///     "students",
///     vec![
///         ColumnDescriptor::new("id", DataType::Int, Value::Int(0), Value::Int(1000)).clustering(),
///         ColumnDescriptor::new("gpa", DataType::Double, Value::Double(0.7), Value::Double(5.0)),
///     ],
/// )
/// .unwrap();
/// let mut table = Table::create("data", schema, StorageConfig::default()).unwrap();
///
/// table
///     .insert(Row::from_pairs("id", [("id", Value::Int(1)), ("gpa", Value::Double(1.2))]))
///     .unwrap();
/// let index = table.create_index(&["gpa"]).unwrap();
/// ```
#[derive(Debug)]
pub struct Table {
    disk: DiskManager,
    state: TableState,
}

impl Table {
    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Create a new, empty table under `root`.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if a capacity is zero
    /// - `Error::TableExists` if the table root file already exists
    pub fn create<P: AsRef<Path>>(root: P, schema: TableSchema, config: StorageConfig) -> Result<Self> {
        config.validate()?;
        let disk = DiskManager::create(root, schema.name())?;

        let table = Self {
            disk,
            state: TableState {
                schema,
                config,
                pages: Vec::new(),
                max_keys: Vec::new(),
                indices: Vec::new(),
                next_page: 0,
                next_index: 0,
            },
        };
        table.save_state()?;

        info!(
            table = table.name(),
            key = %table.state.schema.key_column().name,
            rows_per_page = config.max_rows_per_page,
            refs_per_bucket = config.max_refs_per_bucket,
            "created table"
        );
        Ok(table)
    }

    /// Create a table whose columns come from `catalog`.
    pub fn create_from_catalog<P: AsRef<Path>>(
        root: P,
        catalog: &dyn Catalog,
        table: &str,
        config: StorageConfig,
    ) -> Result<Self> {
        Self::create(root, TableSchema::from_catalog(catalog, table)?, config)
    }

    /// Open an existing table.
    pub fn open<P: AsRef<Path>>(root: P, name: &str) -> Result<Self> {
        let disk = DiskManager::open(root, name)?;
        let state: TableState = disk.read(FileKind::Table, &disk.table_path())?;
        debug!(table = name, pages = state.pages.len(), indices = state.indices.len(), "opened table");
        Ok(Self { disk, state })
    }

    // ========================================================================
    // INSPECTION
    // ========================================================================

    #[inline]
    pub fn name(&self) -> &str {
        self.state.schema.name()
    }

    #[inline]
    pub fn schema(&self) -> &TableSchema {
        &self.state.schema
    }

    #[inline]
    pub fn config(&self) -> &StorageConfig {
        &self.state.config
    }

    /// Page ids in clustering-key order.
    #[inline]
    pub fn page_ids(&self) -> &[PageId] {
        &self.state.pages
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.state.pages.len()
    }

    /// Cached maximum key of each page, parallel to [`page_ids`](Self::page_ids).
    #[inline]
    pub fn max_keys(&self) -> &[Value] {
        &self.state.max_keys
    }

    #[inline]
    pub fn indices(&self) -> &[GridIndex] {
        &self.state.indices
    }

    pub fn index(&self, id: IndexId) -> Option<&GridIndex> {
        self.state.indices.iter().find(|i| i.id() == id)
    }

    /// Every live reference of one index, with its slot.
    pub fn index_references(&self, id: IndexId) -> Result<Vec<(usize, RowRef)>> {
        let index = self
            .index(id)
            .ok_or_else(|| Error::InvalidIndex(format!("{} does not exist", id)))?;
        index.references(&self.disk)
    }

    pub fn load_page(&self, id: PageId) -> Result<Page> {
        self.disk.read_page(id)
    }

    /// Number of rows, counted by loading every page.
    pub fn row_count(&self) -> Result<usize> {
        let mut count = 0;
        for &id in &self.state.pages {
            count += self.disk.read_page(id)?.len();
        }
        Ok(count)
    }

    /// The row with clustering key `key`.
    pub fn get(&self, key: &Value) -> Result<Option<Row>> {
        let pos = match self.locate(key) {
            Some(pos) => pos,
            None => return Ok(None),
        };
        let page = self.disk.read_page(self.state.pages[pos])?;
        Ok(page.find(key).and_then(|offset| page.row_at(offset).cloned()))
    }

    pub fn contains_key(&self, key: &Value) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// I/O counters since the table was created or opened.
    pub fn stats(&self) -> StatsSnapshot {
        self.disk.stats()
    }

    // ========================================================================
    // INSERT
    // ========================================================================

    /// Insert a row at its clustering-key position.
    ///
    /// # Errors
    /// - `Error::MissingClusteringKey` if the row has no key
    /// - `Error::UnknownColumn` for a field outside the schema
    /// - `Error::NonFiniteValue` for a NaN or infinite double
    /// - `Error::DuplicateClusteringKey` if the key already exists; nothing
    ///   is written in that case
    pub fn insert(&mut self, row: Row) -> Result<()> {
        let key_column = self.state.schema.key_column().name.clone();
        let key = row
            .get(&key_column)
            .cloned()
            .ok_or_else(|| Error::MissingClusteringKey(key_column.clone()))?;
        self.check_columns(row.fields())?;
        check_finite(row.fields())?;
        let row = Row::new(key_column, row.into_fields());
        self.rollback_on_error(|table| table.insert_row(row, key))
    }

    fn insert_row(&mut self, row: Row, key: Value) -> Result<()> {
        let capacity = self.state.config.max_rows_per_page;
        if self.state.pages.is_empty() {
            let mut page = self.allocate_page();
            page.append_blind(row.clone());
            self.disk.write_page(&page)?;
            self.state.pages.push(page.id());
            self.state.max_keys.push(key);
            for index in self.state.indices.iter_mut() {
                index.insert(&self.disk, &row, page.id(), 0)?;
            }
            return self.save_state();
        }

        match self.locate(&key) {
            Some(pos) => self.insert_into(pos, row, capacity)?,
            None => self.append(row, key)?,
        }
        self.save_state()
    }

    /// Insert into the page at `pos`, whose max key exceeds the row's key.
    fn insert_into(&mut self, pos: usize, row: Row, capacity: usize) -> Result<()> {
        let target_id = self.state.pages[pos];
        let mut target = self.disk.read_page(target_id)?;
        let outcome = target.insert_sorted(row.clone())?;

        let mut overflow_page = None;
        let mut shifted_page = None;
        if let Some(overflow) = outcome.overflow {
            let overflow_key = overflow.key().cloned();
            let next = pos + 1;

            if next == self.state.pages.len() {
                let page = self.place_in_new_page(next, overflow, overflow_key)?;
                overflow_page = Some(page);
            } else {
                let next_id = self.state.pages[next];
                let mut next_page = self.disk.read_page(next_id)?;
                if next_page.is_full() {
                    let page = self.place_in_new_page(next, overflow, overflow_key)?;
                    overflow_page = Some(page);
                } else {
                    next_page.insert_sorted(overflow)?;
                    self.store_or_drop(next, &next_page)?;
                    debug!(from = %target_id, to = %next_id, "overflow row moved to next page");
                    overflow_page = Some(next_id);
                    shifted_page = Some(next_id);
                }
            }
        }

        self.store_or_drop(pos, &target)?;

        for index in self.state.indices.iter_mut() {
            if let Some(next_id) = shifted_page {
                index.increment(&self.disk, next_id, 0, None, capacity)?;
            }
            index.increment(&self.disk, target_id, outcome.offset, overflow_page, capacity)?;
            index.insert(&self.disk, &row, target_id, outcome.offset)?;
        }
        Ok(())
    }

    /// Allocate a page at position `pos` of the page list holding `row`.
    fn place_in_new_page(&mut self, pos: usize, row: Row, key: Option<Value>) -> Result<PageId> {
        let key = key.ok_or_else(|| Error::MissingClusteringKey(self.state.schema.key_column().name.clone()))?;
        let mut page = self.allocate_page();
        page.append_blind(row);
        self.disk.write_page(&page)?;
        self.state.pages.insert(pos, page.id());
        self.state.max_keys.insert(pos, key);
        debug!(page = %page.id(), pos, "overflow row moved to new page");
        Ok(page.id())
    }

    /// Append a row whose key exceeds every key in the table.
    fn append(&mut self, row: Row, key: Value) -> Result<()> {
        let last = self.state.pages.len() - 1;
        let mut page = self.disk.read_page(self.state.pages[last])?;

        let (page_id, offset) = if page.is_full() {
            let mut fresh = self.allocate_page();
            fresh.append_blind(row.clone());
            self.disk.write_page(&fresh)?;
            self.state.pages.push(fresh.id());
            self.state.max_keys.push(key);
            (fresh.id(), 0)
        } else {
            page.append_blind(row.clone());
            self.disk.write_page(&page)?;
            self.state.max_keys[last] = key;
            (page.id(), page.len() - 1)
        };

        for index in self.state.indices.iter_mut() {
            index.insert(&self.disk, &row, page_id, offset)?;
        }
        Ok(())
    }

    // ========================================================================
    // UPDATE
    // ========================================================================

    /// Apply `changes` to the row with clustering key `key`.
    ///
    /// Returns the updated row.
    ///
    /// # Errors
    /// - `Error::ClusteringKeyImmutable` if `changes` alters the key
    /// - `Error::UnknownColumn` for a column outside the schema
    /// - `Error::NonFiniteValue` for a NaN or infinite double
    /// - `Error::ClusteringKeyNotFound` if no row has this key; the table is
    ///   unchanged
    pub fn update(&mut self, key: &Value, mut changes: FieldMap) -> Result<Row> {
        let key_column = self.state.schema.key_column().name.clone();
        if let Some(new_key) = changes.remove(&key_column) {
            if &new_key != key {
                return Err(Error::ClusteringKeyImmutable(key_column));
            }
        }
        self.check_columns(&changes)?;
        check_finite(&changes)?;
        self.rollback_on_error(|table| table.update_row(key, &changes))
    }

    fn update_row(&mut self, key: &Value, changes: &FieldMap) -> Result<Row> {
        let not_found = || {
            warn!(key = %key, "update found no row");
            Error::ClusteringKeyNotFound(key.to_string())
        };
        let pos = self.locate(key).ok_or_else(not_found)?;
        let page_id = self.state.pages[pos];
        let mut page = self.disk.read_page(page_id)?;
        let offset = page.find(key).ok_or_else(not_found)?;

        let old = page.rows()[offset].clone();
        for index in self.state.indices.iter_mut() {
            if index.overlap(changes) > 0 {
                index.remove(&self.disk, old.fields(), &page)?;
            }
        }

        let (_, new) = page
            .update_by_key(key, changes)
            .ok_or_else(|| Error::ClusteringKeyNotFound(key.to_string()))?;
        self.disk.write_page(&page)?;

        for index in self.state.indices.iter_mut() {
            if index.overlap(changes) > 0 {
                index.insert(&self.disk, &new, page_id, offset)?;
            }
        }
        self.save_state()?;
        Ok(new)
    }

    // ========================================================================
    // DELETE
    // ========================================================================

    /// Delete every row matching all fields of `predicate`.
    ///
    /// A predicate naming the clustering key deletes at most one row. Otherwise
    /// the index with the most columns in common with the predicate narrows the
    /// candidates; without one every page is scanned. An empty predicate
    /// deletes every row. Returns the number of rows deleted.
    pub fn delete(&mut self, predicate: &FieldMap) -> Result<usize> {
        self.check_columns(predicate)?;
        self.rollback_on_error(|table| table.delete_rows(predicate))
    }

    fn delete_rows(&mut self, predicate: &FieldMap) -> Result<usize> {
        let key_column = &self.state.schema.key_column().name;

        let deleted = match predicate.get(key_column) {
            Some(key) => {
                let key = key.clone();
                self.delete_by_key(&key, predicate)?
            }
            None => match self.best_index(predicate) {
                Some(i) => self.delete_indexed(i, predicate)?,
                None => self.delete_scan(predicate)?,
            },
        };

        let count: usize = deleted.values().map(|offsets| offsets.len()).sum();
        if count > 0 {
            for index in self.state.indices.iter_mut() {
                index.delete(&self.disk, &deleted)?;
            }
            self.save_state()?;
        }
        debug!(table = self.name(), count, "deleted rows");
        Ok(count)
    }

    fn delete_by_key(&mut self, key: &Value, predicate: &FieldMap) -> Result<Candidates> {
        let mut deleted = Candidates::new();
        let pos = match self.locate(key) {
            Some(pos) => pos,
            None => return Ok(deleted),
        };
        let mut page = self.disk.read_page(self.state.pages[pos])?;
        if let Some(offset) = page.delete_at(key, predicate) {
            deleted.entry(page.id()).or_default().insert(offset);
            self.store_or_drop(pos, &page)?;
        }
        Ok(deleted)
    }

    fn delete_indexed(&mut self, index: usize, predicate: &FieldMap) -> Result<Candidates> {
        let candidates = self.state.indices[index].lookup(&self.disk, predicate)?;
        debug!(index = %self.state.indices[index].id(), pages = candidates.len(), "delete via index");

        let mut deleted = Candidates::new();
        for (page_id, offsets) in candidates {
            let pos = match self.state.pages.iter().position(|&p| p == page_id) {
                Some(pos) => pos,
                None => continue,
            };
            let mut page = self.disk.read_page(page_id)?;
            let removed = page.delete_at_offsets(&offsets, predicate);
            if !removed.is_empty() {
                deleted.insert(page_id, removed.into_iter().collect());
                self.store_or_drop(pos, &page)?;
            }
        }
        Ok(deleted)
    }

    fn delete_scan(&mut self, predicate: &FieldMap) -> Result<Candidates> {
        let mut deleted = Candidates::new();
        let mut pos = 0;
        while pos < self.state.pages.len() {
            let page_id = self.state.pages[pos];
            let mut page = self.disk.read_page(page_id)?;
            let removed = page.delete_all_matching(predicate);
            if removed.is_empty() {
                pos += 1;
                continue;
            }
            deleted.insert(page_id, removed.into_iter().collect());
            if !self.store_or_drop(pos, &page)? {
                pos += 1;
            }
        }
        Ok(deleted)
    }

    /// Index with the most columns in `predicate`; ties keep the first.
    fn best_index(&self, predicate: &FieldMap) -> Option<usize> {
        let mut best = None;
        let mut best_overlap = 0;
        for (i, index) in self.state.indices.iter().enumerate() {
            let overlap = index.overlap(predicate);
            if overlap > best_overlap {
                best = Some(i);
                best_overlap = overlap;
            }
        }
        best
    }

    // ========================================================================
    // SELECT
    // ========================================================================

    /// Lazily scan the rows matching `terms` joined by `combinator`.
    ///
    /// Rows come back in clustering-key order. Indices are not consulted.
    ///
    /// # Errors
    /// - `Error::TableNotFound` if a term names another table
    /// - `Error::UnknownColumn` if a term names a column outside the schema
    pub fn select(&self, terms: &[SelectTerm], combinator: Combinator) -> Result<SelectIter<'_>> {
        for term in terms {
            if term.table != self.name() {
                return Err(Error::TableNotFound(term.table.clone()));
            }
            self.state.schema.require(&term.column)?;
        }
        Ok(SelectIter::new(
            &self.disk,
            self.state.pages.clone(),
            terms.to_vec(),
            combinator,
        ))
    }

    /// Every row, in clustering-key order.
    pub fn scan(&self) -> SelectIter<'_> {
        SelectIter::new(&self.disk, self.state.pages.clone(), Vec::new(), Combinator::And)
    }

    // ========================================================================
    // INDEXES
    // ========================================================================

    /// Build a grid index over `columns` and backfill it from every row.
    pub fn create_index(&mut self, columns: &[&str]) -> Result<IndexId> {
        self.rollback_on_error(|table| table.build_index(columns))
    }

    fn build_index(&mut self, columns: &[&str]) -> Result<IndexId> {
        let descriptors = columns
            .iter()
            .map(|c| self.state.schema.require(c).cloned())
            .collect::<Result<Vec<_>>>()?;

        let id = IndexId::new(self.state.next_index);
        let config = self.state.config;
        let mut index = GridIndex::new(
            id,
            &descriptors,
            config.cells_per_dimension,
            config.max_refs_per_bucket,
        )?;

        let mut rows = 0;
        for &page_id in &self.state.pages {
            let page = self.disk.read_page(page_id)?;
            for (offset, row) in page.rows().iter().enumerate() {
                index.insert(&self.disk, row, page_id, offset)?;
                rows += 1;
            }
        }

        self.state.next_index += 1;
        self.state.indices.push(index);
        for column in columns {
            self.state.schema.mark_indexed(column);
        }
        self.save_state()?;

        info!(table = self.name(), index = %id, columns = ?columns, rows, "built index");
        Ok(id)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// Run a mutation, restoring the in-memory root if it fails so a later
    /// save cannot persist a half-applied change.
    fn rollback_on_error<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.state.clone();
        let result = op(self);
        if result.is_err() {
            self.state = saved;
        }
        result
    }

    /// Position of the first page whose max key is at least `key`.
    fn locate(&self, key: &Value) -> Option<usize> {
        let pos = self.state.max_keys.partition_point(|max| max < key);
        (pos < self.state.pages.len()).then_some(pos)
    }

    fn allocate_page(&mut self) -> Page {
        let id = PageId::new(self.state.next_page);
        self.state.next_page += 1;
        let key = self.state.schema.key_column();
        debug!(table = self.state.schema.name(), page = %id, "allocated page");
        Page::new(
            id,
            self.state.config.max_rows_per_page,
            key.name.clone(),
            key.data_type,
        )
    }

    /// Persist the page at `pos`, or drop it if it is empty.
    ///
    /// Returns whether the page was dropped.
    fn store_or_drop(&mut self, pos: usize, page: &Page) -> Result<bool> {
        match page.max_key() {
            Some(max) => {
                self.disk.write_page(page)?;
                self.state.max_keys[pos] = max.clone();
                Ok(false)
            }
            None => {
                self.disk.remove_page(page.id())?;
                self.state.pages.remove(pos);
                self.state.max_keys.remove(pos);
                debug!(table = self.state.schema.name(), page = %page.id(), "dropped empty page");
                Ok(true)
            }
        }
    }

    fn check_columns(&self, fields: &FieldMap) -> Result<()> {
        for column in fields.keys() {
            self.state.schema.require(column)?;
        }
        Ok(())
    }

    fn save_state(&self) -> Result<()> {
        self.disk
            .write(FileKind::Table, &self.disk.table_path(), &self.state)
    }
}

/// Doubles headed for disk must be finite; JSON cannot carry NaN or infinity.
fn check_finite(fields: &FieldMap) -> Result<()> {
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((column, _)) => Err(Error::NonFiniteValue(column.clone())),
        None => Ok(()),
    }
}
