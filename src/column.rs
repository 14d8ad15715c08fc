//! Module `column` implement the per-column index: a case-sensitive
//! and a case-insensitive half, plus the per-row cache of original and
//! lowercased bytes.

use std::{cmp, mem};

use crate::{charpos::CharPos, db::Bitmap, utf8, Result};

/// Case selector, picks one half of a [ColumnIndex].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Case {
    Sensitive,
    Insensitive,
}

/// Cached byte forms for one row in one column. A default cell holds
/// no value, sql NULL or a reusable hole.
#[derive(Clone, Default)]
pub struct Cell {
    pub orig: Option<Vec<u8>>,
    pub lower: Option<Vec<u8>>,
}

impl Cell {
    fn bytes(&self, case: Case) -> Option<&[u8]> {
        match case {
            Case::Sensitive => self.orig.as_deref(),
            Case::Insensitive => self.lower.as_deref(),
        }
    }
}

/// One case half of a column index. Length arrays are never shared
/// between halves, case folding can change character counts.
pub struct Half<B> {
    pub pos: CharPos<B>,
    pub neg: CharPos<B>,
    presence: Vec<B>,
    len_eq: Vec<B>,
    len_ge: Vec<B>,
    max_length: usize,
}

impl<B> Half<B>
where
    B: Bitmap,
{
    fn new() -> Half<B> {
        Half {
            pos: CharPos::new(),
            neg: CharPos::new(),
            presence: (0..256).map(|_| B::default()).collect(),
            len_eq: Vec::new(),
            len_ge: Vec::new(),
            max_length: 0,
        }
    }

    // Index positions and presence for one value, return its character
    // count. Every byte of a multi-byte character lands at the same
    // character position, in both the positive and negative index.
    fn add_positions(&mut self, row: u32, bytes: &[u8]) -> usize {
        let n = utf8::char_count(bytes) as i64;
        let mut p = 0_i64;
        for ch in utf8::char_slices(bytes) {
            for &b in ch {
                self.pos.set(b, p as i32, row);
                self.neg.set(b, (p - n) as i32, row);
                self.presence[b as usize].add(row);
            }
            p += 1;
        }
        let n = n as usize;
        if n > self.max_length {
            self.max_length = n;
        }
        n
    }

    // Grow both length arrays to hold slot `n`, doubling; new slots are
    // fully initialized before they become reachable.
    fn reserve_length(&mut self, n: usize) {
        if self.len_eq.len() <= n {
            let cap = cmp::max(self.len_eq.len() * 2, n + 1);
            self.len_eq.resize_with(cap, B::default);
            self.len_ge.resize_with(cap, B::default);
        }
    }

    fn add_length(&mut self, row: u32, n: usize) {
        self.reserve_length(n);
        self.len_eq[n].add(row);
        for k in 0..=n {
            self.len_ge[k].add(row);
        }
    }

    fn remove_value(&mut self, row: u32, bytes: &[u8]) {
        let n = utf8::char_count(bytes) as i64;
        let mut p = 0_i64;
        for ch in utf8::char_slices(bytes) {
            for &b in ch {
                self.pos.unset(b, p as i32, row);
                self.neg.unset(b, (p - n) as i32, row);
                self.presence[b as usize].remove(row);
            }
            p += 1;
        }
        let n = n as usize;
        if n < self.len_eq.len() {
            self.len_eq[n].remove(row);
        }
        for k in 0..cmp::min(n + 1, self.len_ge.len()) {
            self.len_ge[k].remove(row);
        }
    }

    fn bulk_remove(&mut self, batch: &B) {
        self.pos.bulk_remove(batch);
        self.neg.bulk_remove(batch);
        for bitmap in self.presence.iter_mut() {
            bitmap.andnot_inplace(batch);
        }
        for bitmap in self.len_eq.iter_mut() {
            bitmap.andnot_inplace(batch);
        }
        for bitmap in self.len_ge.iter_mut() {
            bitmap.andnot_inplace(batch);
        }
    }

    // Rebuild both length arrays from the cached values, L_ge built
    // backward-prefix-cumulatively from L_eq.
    fn seal(&mut self, cells: &[Cell], case: Case) {
        let cap = self.max_length + 1;
        self.len_eq = (0..cap).map(|_| B::default()).collect();
        for (row, cell) in cells.iter().enumerate() {
            if let Some(bytes) = cell.bytes(case) {
                let n = utf8::char_count(bytes);
                self.len_eq[n].add(row as u32);
            }
        }
        self.len_ge = (0..cap).map(|_| B::default()).collect();
        let mut acc = B::default();
        for k in (0..cap).rev() {
            acc.or_inplace(&self.len_eq[k]);
            self.len_ge[k] = acc.clone();
        }
    }

    /// Rows whose value in this half contains `byte` anywhere. First
    /// pass filter for the substring scan.
    pub fn presence(&self, byte: u8) -> &B {
        &self.presence[byte as usize]
    }

    /// Rows whose value in this half has at least `k` characters.
    /// Empty when `k` exceeds the largest length ever observed.
    pub fn length_ge(&self, k: usize) -> B {
        if k > self.max_length || k >= self.len_ge.len() {
            B::default()
        } else {
            self.len_ge[k].clone()
        }
    }

    /// Rows whose value in this half is exactly `k` characters long.
    pub fn length_eq(&self, k: usize) -> B {
        if k >= self.len_eq.len() {
            B::default()
        } else {
            self.len_eq[k].clone()
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn footprint(&self) -> usize {
        let presence: usize = self.presence.iter().map(|b| b.footprint()).sum();
        let lengths: usize = self
            .len_eq
            .iter()
            .chain(self.len_ge.iter())
            .map(|b| b.footprint())
            .sum();
        self.pos.footprint() + self.neg.footprint() + presence + lengths
    }
}

/// Per-column index. The case-sensitive half sees the original bytes,
/// the case-insensitive half the lowercased form.
pub struct ColumnIndex<B> {
    cs: Half<B>,
    ci: Half<B>,
    cells: Vec<Cell>,
}

impl<B> ColumnIndex<B>
where
    B: Bitmap,
{
    pub fn new() -> ColumnIndex<B> {
        ColumnIndex { cs: Half::new(), ci: Half::new(), cells: Vec::new() }
    }

    pub fn half(&self, case: Case) -> &Half<B> {
        match case {
            Case::Sensitive => &self.cs,
            Case::Insensitive => &self.ci,
        }
    }

    /// Cached bytes for `row`, in the given case form.
    pub fn cell_bytes(&self, row: u32, case: Case) -> Option<&[u8]> {
        self.cells.get(row as usize).and_then(|cell| cell.bytes(case))
    }

    fn reserve_row(&mut self, row: u32) {
        if self.cells.len() <= row as usize {
            self.cells.resize_with(row as usize + 1, Cell::default);
        }
    }

    /// Full incremental indexing, the insert path.
    pub fn index_value(&mut self, row: u32, orig: Vec<u8>, lower: Vec<u8>) {
        self.reserve_row(row);
        let n_cs = self.cs.add_positions(row, &orig);
        self.cs.add_length(row, n_cs);
        let n_ci = self.ci.add_positions(row, &lower);
        self.ci.add_length(row, n_ci);
        self.cells[row as usize] = Cell { orig: Some(orig), lower: Some(lower) };
    }

    /// Position-only indexing, the bulk-build path. Length arrays are
    /// derived by [ColumnIndex::seal] once the pass is over.
    pub fn load_value(&mut self, row: u32, orig: Vec<u8>, lower: Vec<u8>) {
        self.reserve_row(row);
        self.cs.add_positions(row, &orig);
        self.ci.add_positions(row, &lower);
        self.cells[row as usize] = Cell { orig: Some(orig), lower: Some(lower) };
    }

    /// Mark `row` as holding no value in this column.
    pub fn set_null(&mut self, row: u32) {
        self.reserve_row(row);
        self.cells[row as usize] = Cell::default();
    }

    /// Derive both halves' length arrays from the cached values.
    pub fn seal(&mut self) {
        self.cs.seal(&self.cells, Case::Sensitive);
        self.ci.seal(&self.cells, Case::Insensitive);
    }

    /// Remove `row` from every bitmap currently touching it, guided by
    /// the cached bytes; clears the cache slot.
    pub fn unindex_value(&mut self, row: u32) {
        let cell = match self.cells.get_mut(row as usize) {
            Some(cell) => mem::take(cell),
            None => return,
        };
        if let Some(orig) = &cell.orig {
            self.cs.remove_value(row, orig);
        }
        if let Some(lower) = &cell.lower {
            self.ci.remove_value(row, lower);
        }
    }

    /// Settle one delete batch: andnot `batch` across every bitmap in
    /// both halves and clear the affected cache slots. Only this
    /// batch's rows are settled here, earlier tombstones were settled
    /// by the delete cycle that created them.
    pub fn bulk_remove(&mut self, batch: &B, rows: &[u32]) {
        self.cs.bulk_remove(batch);
        self.ci.bulk_remove(batch);
        for &row in rows {
            if (row as usize) < self.cells.len() {
                self.cells[row as usize] = Cell::default();
            }
        }
    }

    /// Re-check the data-model invariants for one live row.
    pub fn validate_row(&self, row: u32) -> Result<()> {
        for case in [Case::Sensitive, Case::Insensitive].iter() {
            let bytes = match self.cell_bytes(row, *case) {
                Some(bytes) => bytes.to_vec(),
                None => continue,
            };
            let half = self.half(*case);
            let n = utf8::char_count(&bytes) as i64;
            if !half.length_eq(n as usize).contains(row) {
                return err_at!(Fatal, msg: "row {} missing in len_eq[{}]", row, n);
            }
            for k in 0..=(n as usize) {
                if !half.length_ge(k).contains(row) {
                    return err_at!(Fatal, msg: "row {} missing in len_ge[{}]", row, k);
                }
            }
            let mut p = 0_i64;
            for ch in utf8::char_slices(&bytes) {
                for &b in ch {
                    let ok = half.pos.get(b, p as i32).map_or(false, |bm| bm.contains(row));
                    if !ok {
                        return err_at!(Fatal, msg: "row {} missing at pos[{}][{}]", row, b, p);
                    }
                    let ok = half
                        .neg
                        .get(b, (p - n) as i32)
                        .map_or(false, |bm| bm.contains(row));
                    if !ok {
                        return err_at!(Fatal, msg: "row {} missing at neg[{}][{}]", row, b, p - n);
                    }
                    if !half.presence(b).contains(row) {
                        return err_at!(Fatal, msg: "row {} missing in presence[{}]", row, b);
                    }
                }
                p += 1;
            }
        }
        Ok(())
    }

    /// Populated `(position, bitmap)` entries across both halves.
    pub fn n_entries(&self) -> usize {
        self.cs.pos.n_entries()
            + self.cs.neg.n_entries()
            + self.ci.pos.n_entries()
            + self.ci.neg.n_entries()
    }

    pub fn footprint(&self) -> usize {
        let cells: usize = self
            .cells
            .iter()
            .map(|cell| {
                cell.orig.as_ref().map_or(0, |b| b.len())
                    + cell.lower.as_ref().map_or(0, |b| b.len())
            })
            .sum();
        self.cs.footprint() + self.ci.footprint() + cells
    }
}

#[cfg(test)]
#[path = "column_test.rs"]
mod column_test;
