//! In-memory cache backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracker_core::{StorageError, TrackerResult};

use super::key::CacheKey;
use super::traits::{CacheBackend, CacheStats};

/// HashMap-backed cache. Counters are atomics so read paths only take the
/// map lock for the lookup itself.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<CacheKey, serde_json::Value>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for InMemoryCacheBackend {
    fn get_raw(&self, key: &CacheKey) -> TrackerResult<Option<serde_json::Value>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        match entries.get(key) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value.clone()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    fn put_raw(&self, key: CacheKey, value: serde_json::Value) -> TrackerResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key, value);
        Ok(())
    }

    fn evict(&self, key: &CacheKey) -> TrackerResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        if entries.remove(key).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    fn evict_many(&self, keys: &[CacheKey]) -> TrackerResult<()> {
        // One lock acquisition for the whole batch.
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        for key in keys {
            if entries.remove(key).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    fn clear(&self) -> TrackerResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let removed = entries.len() as u64;
        entries.clear();
        self.evictions.fetch_add(removed, Ordering::Relaxed);
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries.read().map(|m| m.len() as u64).unwrap_or(0);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
        }
    }
}
