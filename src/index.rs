//! Module `index` implement the biscuit index container: the row
//! table, the per-column indices, tombstones, free list, and the
//! build, mutation and query entry points.

use log::{debug, info};

use std::{collections::HashMap, fmt, result, sync::atomic::AtomicBool};

use crate::{
    collect,
    column::ColumnIndex,
    db::{Bitmap, CaseFold, Predicate, QueryOpts, ResultSink, Row, Tid, UnicodeCaseFold},
    marker::Marker,
    plan, Result, TOMBSTONE_RESET_THRESHOLD,
};

/// Secondary index for wildcard matching over one or more string
/// columns of a tabular store.
///
/// The whole index is process-resident; nothing but a presence
/// [Marker] is persisted. Internal row-ids are dense, never
/// renumbered, and holes left by deletes are reused through the free
/// list. Queries take `&self`, mutation is serialized with respect to
/// queries by the host.
pub struct Index<B>
where
    B: Bitmap,
{
    name: String,
    columns: Vec<ColumnIndex<B>>,
    tids: Vec<Tid>,
    map: HashMap<Tid, u32>,
    free: Vec<u32>,
    tombstones: B,
    folder: Box<dyn CaseFold>,

    n_inserts: usize,
    n_updates: usize,
    n_deletes: usize,
}

impl<B> Index<B>
where
    B: Bitmap,
{
    pub fn new(name: &str, n_columns: usize) -> Index<B> {
        Index {
            name: name.to_string(),
            columns: (0..n_columns).map(|_| ColumnIndex::new()).collect(),
            tids: Vec::new(),
            map: HashMap::new(),
            free: Vec::new(),
            tombstones: B::default(),
            folder: Box::new(UnicodeCaseFold),

            n_inserts: 0,
            n_updates: 0,
            n_deletes: 0,
        }
    }

    /// Replace the lowercaser, e.g. with a locale-aware collation hook
    /// supplied by the host.
    pub fn set_case_fold(&mut self, folder: Box<dyn CaseFold>) -> &mut Self {
        self.folder = folder;
        self
    }

    /// Return name of this index instance.
    #[inline]
    pub fn to_name(&self) -> String {
        self.name.clone()
    }

    /// Number of live rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub(crate) fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub(crate) fn column(&self, c: usize) -> &ColumnIndex<B> {
        &self.columns[c]
    }

    #[inline]
    pub(crate) fn tombstones(&self) -> &B {
        &self.tombstones
    }

    #[inline]
    pub(crate) fn tid_table(&self) -> &[Tid] {
        &self.tids
    }

    pub(crate) fn fold(&self, bytes: &[u8]) -> Vec<u8> {
        self.folder.lowercase(bytes)
    }

    /// Bulk build from a row source, one pass. Positions and presence
    /// are indexed inline; length arrays are derived at seal time from
    /// the cached values, which is cheaper than maintaining the
    /// backward-cumulative `L_ge` during the pass. Returns the
    /// presence marker for the host to persist.
    pub fn build_index<I>(&mut self, iter: I) -> Result<Marker>
    where
        I: Iterator<Item = Row>,
    {
        for (tid, values) in iter {
            self.load_row(tid, values)?;
        }
        for col in self.columns.iter_mut() {
            col.seal();
        }
        info!(
            target: "biscuit",
            "index {} built, {} rows over {} columns",
            self.name, self.map.len(), self.columns.len()
        );
        Ok(Marker::new(self.tids.len() as u32))
    }

    fn load_row(&mut self, tid: Tid, values: Vec<Option<Vec<u8>>>) -> Result<()> {
        if values.len() != self.columns.len() {
            return err_at!(
                InvalidInput, msg: "{} values for {} columns", values.len(), self.columns.len()
            );
        }
        if self.map.contains_key(&tid) {
            // a duplicate tid in the source is treated as a revisit.
            return self.insert(tid, values);
        }
        let row = self.alloc(tid);
        for (col, value) in self.columns.iter_mut().zip(values.into_iter()) {
            match value {
                Some(bytes) => {
                    let lower = self.folder.lowercase(&bytes);
                    col.load_value(row, bytes, lower);
                }
                None => col.set_null(row),
            }
        }
        Ok(())
    }

    // Hand out the next internal row-id, reusing a hole when one is
    // held by the free list. Stale state at a reused slot is cleared
    // before the id becomes visible.
    fn alloc(&mut self, tid: Tid) -> u32 {
        let row = match self.free.pop() {
            Some(row) => row,
            None => {
                let row = self.tids.len() as u32;
                self.tids.push(Tid::default());
                row
            }
        };
        self.tombstones.remove(row);
        self.tids[row as usize] = tid;
        self.map.insert(tid, row);
        row
    }

    /// Insert one row, or revisit the tid if it is already indexed: the
    /// old value is unindexed from every column, then the new value is
    /// indexed in its place.
    pub fn insert(&mut self, tid: Tid, values: Vec<Option<Vec<u8>>>) -> Result<()> {
        if values.len() != self.columns.len() {
            return err_at!(
                InvalidInput, msg: "{} values for {} columns", values.len(), self.columns.len()
            );
        }
        let row = match self.map.get(&tid).copied() {
            Some(row) => {
                for col in self.columns.iter_mut() {
                    col.unindex_value(row);
                }
                self.tombstones.remove(row);
                self.n_updates += 1;
                row
            }
            None => {
                self.n_inserts += 1;
                self.alloc(tid)
            }
        };
        for (col, value) in self.columns.iter_mut().zip(values.into_iter()) {
            match value {
                Some(bytes) => {
                    let lower = self.folder.lowercase(&bytes);
                    col.index_value(row, bytes, lower);
                }
                None => col.set_null(row),
            }
        }
        Ok(())
    }

    /// Bulk delete every live row whose tid the oracle marks. The
    /// batch is settled against every bitmap immediately; the
    /// tombstones bitmap only masks queries until it is reset at
    /// [TOMBSTONE_RESET_THRESHOLD]. Returns the batch size.
    pub fn bulk_delete<F>(&mut self, mut oracle: F) -> Result<usize>
    where
        F: FnMut(&Tid) -> bool,
    {
        let mut batch = B::default();
        let mut victims: Vec<(Tid, u32)> = Vec::new();
        for (tid, &row) in self.map.iter() {
            if oracle(tid) {
                batch.add(row);
                victims.push((*tid, row));
            }
        }
        if victims.is_empty() {
            return Ok(0);
        }

        // settle only this batch. Subtracting the full tombstone set
        // here would re-remove rows whose slot has since been reused.
        let rows: Vec<u32> = victims.iter().map(|(_, row)| *row).collect();
        for col in self.columns.iter_mut() {
            col.bulk_remove(&batch, &rows);
        }
        for (tid, row) in victims.iter() {
            self.map.remove(tid);
            self.free.push(*row);
        }
        self.tombstones.or_inplace(&batch);
        self.n_deletes += victims.len();
        debug!(
            target: "biscuit",
            "index {} deleted {} rows, {} tombstones",
            self.name, victims.len(), self.tombstones.len()
        );

        if self.tombstones.len() >= TOMBSTONE_RESET_THRESHOLD {
            // every batch settled its own debt above, the mask can go.
            self.tombstones = B::default();
            info!(target: "biscuit", "index {} tombstones reset", self.name);
        }
        Ok(victims.len())
    }

    /// Run one query, a conjunction of predicates, and return matching
    /// tids, finalized per `opts`. `cancel` is honored between
    /// predicates, between windowed-match recursion frames and once
    /// per chunk while collecting.
    pub fn query(
        &self,
        preds: &[Predicate],
        opts: &QueryOpts,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<Tid>> {
        let result = plan::execute(self, preds, cancel)?;
        collect::finalize(self, result, opts, cancel)
    }

    /// Same as [Index::query], feeding the result to `sink`.
    pub fn query_into<S>(
        &self,
        preds: &[Predicate],
        opts: &QueryOpts,
        cancel: Option<&AtomicBool>,
        sink: &mut S,
    ) -> Result<()>
    where
        S: ResultSink,
    {
        let tids = self.query(preds, opts, cancel)?;
        sink.accept(tids);
        Ok(())
    }

    pub fn to_stats(&self) -> Stats {
        let footprint = {
            let columns: usize = self.columns.iter().map(|col| col.footprint()).sum();
            columns + self.tids.len() * 8 + self.tombstones.footprint()
        };
        Stats {
            name: self.name.clone(),
            n_columns: self.columns.len(),
            n_rows: self.tids.len(),
            n_live: self.map.len(),
            n_tombstones: self.tombstones.len(),
            n_free: self.free.len(),
            n_entries: self.columns.iter().map(|col| col.n_entries()).sum(),
            n_inserts: self.n_inserts,
            n_updates: self.n_updates,
            n_deletes: self.n_deletes,
            footprint,
        }
    }

    /// Re-check the data-model invariants for every live row.
    /// O(rows × value-length), meant for tests and debug assertions.
    pub fn validate(&self) -> Result<()> {
        for (tid, &row) in self.map.iter() {
            match self.tids.get(row as usize) {
                Some(t) if t == tid => (),
                _ => return err_at!(Fatal, msg: "tid table disagrees at {}", row),
            }
            if self.tombstones.contains(row) {
                return err_at!(Fatal, msg: "live row {} is tombstoned", row);
            }
            for col in self.columns.iter() {
                col.validate_row(row)?;
            }
        }
        // every allocated slot is either live or held by the free list.
        if self.map.len() + self.free.len() != self.tids.len() {
            return err_at!(
                Fatal, msg: "row accounting {}+{} != {}",
                self.map.len(), self.free.len(), self.tids.len()
            );
        }
        Ok(())
    }
}

/// Statistic type, for [Index].
pub struct Stats {
    pub name: String,
    pub n_columns: usize,
    pub n_rows: usize,
    pub n_live: usize,
    pub n_tombstones: usize,
    pub n_free: usize,
    pub n_entries: usize,
    pub n_inserts: usize,
    pub n_updates: usize,
    pub n_deletes: usize,
    pub footprint: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        writeln!(f, "biscuit.name = {}", self.name)?;
        writeln!(
            f,
            "biscuit = {{ n_columns={}, n_rows={}, n_live={}, n_tombstones={}, n_free={} }}",
            self.n_columns, self.n_rows, self.n_live, self.n_tombstones, self.n_free,
        )?;
        writeln!(
            f,
            "biscuit = {{ n_entries={}, n_inserts={}, n_updates={}, n_deletes={}, footprint={} }}",
            self.n_entries, self.n_inserts, self.n_updates, self.n_deletes, self.footprint,
        )
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
