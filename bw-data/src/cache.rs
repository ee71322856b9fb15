//! Memo tables for remote results.
//!
//! Entries are never evicted: the key space is bounded by what a user can
//! select, and a cached result stays valid for the life of the process.

use std::collections::HashMap;
use std::hash::Hash;

use bw_gee::geometry::GeometryKey;
use bw_gee::index::IndexKind;
use bw_gee::period::Period;
use bw_gee::raster::IndexImage;

use crate::series::TimeSeries;

/// Unbounded map from request key to result, with hit/miss counters.
#[derive(Debug)]
pub struct MemoCache<K, V> {
    inner: HashMap<K, V>,
    hits: u64,
    misses: u64,
}

impl<K: Eq + Hash, V: Clone> MemoCache<K, V> {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// A clone of the cached value, if present.
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.inner.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<K: Eq + Hash, V: Clone> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Key of a monthly composite lookup.
pub type ImageKey = (Period, IndexKind);

/// Key of a yearly series: sorted years, month, index, boundary, scale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub years: Vec<i32>,
    pub month: u32,
    pub kind: IndexKind,
    pub boundary: GeometryKey,
    pub scale: u32,
}

/// Absence (no scenes) is cached too.
pub type ImageCache = MemoCache<ImageKey, Option<IndexImage>>;

pub type SeriesCache = MemoCache<SeriesKey, TimeSeries>;
