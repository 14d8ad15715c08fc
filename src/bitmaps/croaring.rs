//! Module `croaring` implement the [Bitmap] trait for
//! [roaring bitmap][roaring-bitmap].
//!
//! [Bitmap]: crate::db::Bitmap
//! [roaring-bitmap]: https://roaringbitmap.org

use croaring::bitmap::Bitmap;

use std::{fmt, result};

use crate::db;

/// Compressed bitmap backend, the default.
#[derive(Clone)]
pub struct CRoaring {
    bitmap: Bitmap,
}

impl Default for CRoaring {
    fn default() -> CRoaring {
        CRoaring { bitmap: Bitmap::create() }
    }
}

impl fmt::Debug for CRoaring {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "CRoaring<{}>", self.bitmap.cardinality())
    }
}

impl db::Bitmap for CRoaring {
    #[inline]
    fn add(&mut self, row: u32) {
        self.bitmap.add(row)
    }

    #[inline]
    fn remove(&mut self, row: u32) {
        self.bitmap.remove(row)
    }

    #[inline]
    fn contains(&self, row: u32) -> bool {
        self.bitmap.contains(row)
    }

    #[inline]
    fn len(&self) -> usize {
        self.bitmap.cardinality() as usize
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    #[inline]
    fn and_inplace(&mut self, other: &CRoaring) {
        self.bitmap.and_inplace(&other.bitmap)
    }

    #[inline]
    fn or_inplace(&mut self, other: &CRoaring) {
        self.bitmap.or_inplace(&other.bitmap)
    }

    #[inline]
    fn andnot_inplace(&mut self, other: &CRoaring) {
        self.bitmap.andnot_inplace(&other.bitmap)
    }

    #[inline]
    fn to_vec(&self) -> Vec<u32> {
        self.bitmap.to_vec()
    }

    fn footprint(&self) -> usize {
        self.bitmap.get_serialized_size_in_bytes()
    }
}

#[cfg(test)]
#[path = "croaring_test.rs"]
mod croaring_test;
