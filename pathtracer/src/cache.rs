//! Process-wide cache of diced grids, keyed by the primitive that produced
//! them plus the ray footprint that decided the dice rate.
//!
//! Every [`crate::primitive::bilinear::Bilinear`] holds a [`GridKey`] once
//! it's been diced; subsequent traversals look the grid up here instead of
//! re-dicing. The cache is capacity-bounded and evicts the least recently
//! touched entry, mirroring the original renderer's grid cache without
//! literally porting its node/bucket layout. Injected explicitly into the
//! integrator rather than reached via a global, so tests can use small,
//! independent caches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::grid::Grid;

/// Opaque handle identifying one cached grid. Issued by [`GridCache::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridKey(u64);

struct Entry {
    grid: Arc<Grid>,
    last_touch: u64,
}

struct Inner {
    entries: HashMap<u64, Entry>,
    next_key: u64,
    clock: u64,
    capacity: usize,
}

pub struct GridCache {
    inner: Mutex<Inner>,
}

impl GridCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_key: 0,
                clock: 0,
                capacity: capacity.max(1),
            }),
        }
    }

    /// True if `key` currently has a resident grid.
    pub fn exists(&self, key: GridKey) -> bool {
        self.inner.lock().unwrap().entries.contains_key(&key.0)
    }

    /// Inserts a freshly diced grid, evicting the least recently touched
    /// entry first if the cache is at capacity. Returns the key to look it
    /// up by later.
    pub fn insert(&self, grid: Grid) -> GridKey {
        let mut inner = self.inner.lock().unwrap();
        if inner.entries.len() >= inner.capacity {
            if let Some((&lru_key, _)) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_touch)
            {
                inner.entries.remove(&lru_key);
            }
        }
        let key = inner.next_key;
        inner.next_key += 1;
        let clock = inner.clock;
        inner.clock += 1;
        inner.entries.insert(
            key,
            Entry {
                grid: Arc::new(grid),
                last_touch: clock,
            },
        );
        GridKey(key)
    }

    /// Fetches the grid for `key`, bumping its recency, or `None` if it was
    /// evicted.
    pub fn touch(&self, key: GridKey) -> Option<Arc<Grid>> {
        let mut inner = self.inner.lock().unwrap();
        let clock = inner.clock;
        inner.clock += 1;
        let entry = inner.entries.get_mut(&key.0)?;
        entry.last_touch = clock;
        Some(Arc::clone(&entry.grid))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
