//! Traits and types required by rest of the biscuit-modules.

use std::{fmt, result, str};

/// Tuple identifier, the stable `(block, offset)` address a row source
/// hands out for each row. The index stores tids verbatim and never
/// interprets them, except to order results by `(block, offset)` when
/// a sorted result is requested.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Tid {
    pub block: u32,
    pub offset: u16,
}

impl Tid {
    pub fn new(block: u32, offset: u16) -> Tid {
        Tid { block, offset }
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "({},{})", self.block, self.offset)
    }
}

/// Item yielded by a row source while building an index. The value
/// list holds one optional utf8 byte-string per indexed column, `None`
/// marking a NULL. NULL rows still get an internal row-id so that a
/// later insert on the same tid can re-populate the columns.
pub type Row = (Tid, Vec<Option<Vec<u8>>>);

/// Wildcard operators supported by the query interface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operator {
    Like,
    NotLike,
    Ilike,
    NotIlike,
}

impl Operator {
    #[inline]
    pub fn is_negated(&self) -> bool {
        match self {
            Operator::NotLike | Operator::NotIlike => true,
            Operator::Like | Operator::Ilike => false,
        }
    }

    #[inline]
    pub fn is_case_insensitive(&self) -> bool {
        match self {
            Operator::Ilike | Operator::NotIlike => true,
            Operator::Like | Operator::NotLike => false,
        }
    }
}

/// One predicate of a query: a column ordinal, a wildcard operator and
/// the pattern bytes. `%` and `_` are the only metacharacters, `\` is
/// passed through literally.
#[derive(Clone, Debug)]
pub struct Predicate {
    pub column: usize,
    pub op: Operator,
    pub pattern: Vec<u8>,
}

impl Predicate {
    pub fn new(column: usize, op: Operator, pattern: &[u8]) -> Predicate {
        Predicate { column, op, pattern: pattern.to_vec() }
    }
}

/// Finalization controls for one query. `sorted` is false for
/// aggregate/bitmap-scan style consumers; `limit` caps the result when
/// set.
#[derive(Clone, Debug)]
pub struct QueryOpts {
    pub sorted: bool,
    pub limit: Option<usize>,
}

impl Default for QueryOpts {
    fn default() -> QueryOpts {
        QueryOpts { sorted: true, limit: None }
    }
}

/// Trait for a set of row-ids. Two implementations are provided under
/// [bitmaps][crate::bitmaps], a compressed roaring-bitmap adaptor and a
/// dense word-array fallback; everything else in this package is
/// generic over this trait.
pub trait Bitmap: Clone + Default {
    /// Add `row` to the set.
    fn add(&mut self, row: u32);

    /// Drop `row` from the set.
    fn remove(&mut self, row: u32);

    /// Check whether `row` is present.
    fn contains(&self, row: u32) -> bool;

    /// Cardinality of the set.
    fn len(&self) -> usize;

    /// Check whether the set is empty.
    fn is_empty(&self) -> bool;

    /// self := self ∩ other
    fn and_inplace(&mut self, other: &Self);

    /// self := self ∪ other
    fn or_inplace(&mut self, other: &Self);

    /// self := self \ other
    fn andnot_inplace(&mut self, other: &Self);

    /// Rows in ascending order.
    fn to_vec(&self) -> Vec<u32>;

    /// Approximate memory footprint, in bytes.
    fn footprint(&self) -> usize;
}

/// Locale-aware lowercaser seam. The host supplies its collation's
/// folding here; [UnicodeCaseFold] is the default.
pub trait CaseFold {
    /// Map a utf8 byte sequence to its lowercase form. Must be total,
    /// malformed input comes back folded byte-wise.
    fn lowercase(&self, bytes: &[u8]) -> Vec<u8>;
}

/// Default case folder over [str::to_lowercase]. Malformed spans are
/// folded byte-wise in ascii and copied through otherwise.
#[derive(Clone, Copy, Default)]
pub struct UnicodeCaseFold;

impl CaseFold for UnicodeCaseFold {
    fn lowercase(&self, bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(bytes.len());
        let mut rest = bytes;
        while !rest.is_empty() {
            match str::from_utf8(rest) {
                Ok(s) => {
                    out.extend_from_slice(s.to_lowercase().as_bytes());
                    break;
                }
                Err(err) => {
                    let (valid, bad) = rest.split_at(err.valid_up_to());
                    if let Ok(s) = str::from_utf8(valid) {
                        out.extend_from_slice(s.to_lowercase().as_bytes());
                    }
                    let n = err.error_len().unwrap_or(bad.len());
                    out.extend(bad[..n].iter().map(|b| b.to_ascii_lowercase()));
                    rest = &bad[n..];
                }
            }
        }
        out
    }
}

/// Consumer of query results. Empty result means [ResultSink::accept]
/// is called with an empty list.
pub trait ResultSink {
    fn accept(&mut self, tids: Vec<Tid>);
}

impl ResultSink for Vec<Tid> {
    fn accept(&mut self, mut tids: Vec<Tid>) {
        self.append(&mut tids)
    }
}

#[cfg(test)]
#[path = "db_test.rs"]
mod db_test;
