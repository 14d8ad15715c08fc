//! Module `registry` implement the per-process cache of biscuit
//! indexes, keyed by an application supplied handle.

use std::{
    collections::{hash_map::Entry, HashMap},
    hash::Hash,
};

use crate::{db::Bitmap, index::Index, Result};

/// Explicitly owned registry of live indexes. The host keeps one per
/// process and drops it at process exit; there are no hidden globals.
pub struct Registry<H, B>
where
    H: Eq + Hash,
    B: Bitmap,
{
    indexes: HashMap<H, Index<B>>,
}

impl<H, B> Default for Registry<H, B>
where
    H: Eq + Hash,
    B: Bitmap,
{
    fn default() -> Registry<H, B> {
        Registry { indexes: HashMap::new() }
    }
}

impl<H, B> Registry<H, B>
where
    H: Eq + Hash,
    B: Bitmap,
{
    pub fn new() -> Registry<H, B> {
        Registry::default()
    }

    pub fn get(&self, handle: &H) -> Option<&Index<B>> {
        self.indexes.get(handle)
    }

    pub fn get_mut(&mut self, handle: &H) -> Option<&mut Index<B>> {
        self.indexes.get_mut(handle)
    }

    /// Fetch the index for `handle`, running `load` to rebuild it on a
    /// cache miss. This is the lazy loader path: the persisted marker
    /// only records that the index exists, the bitmaps are rebuilt
    /// here by replaying the row source.
    pub fn get_or_load<F>(&mut self, handle: H, load: F) -> Result<&mut Index<B>>
    where
        F: FnOnce() -> Result<Index<B>>,
    {
        match self.indexes.entry(handle) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(load()?)),
        }
    }

    /// Register `index` under `handle`, returning the evicted index if
    /// the handle was taken.
    pub fn set(&mut self, handle: H, index: Index<B>) -> Option<Index<B>> {
        self.indexes.insert(handle, index)
    }

    /// Drop the index for `handle`, e.g. on cache invalidation.
    pub fn remove(&mut self, handle: &H) -> Option<Index<B>> {
        self.indexes.remove(handle)
    }

    pub fn handles(&self) -> Vec<&H> {
        self.indexes.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
