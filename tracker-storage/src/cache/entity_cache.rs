//! Typed facade over a raw cache backend.
//!
//! Owns serialization so backends can stay object-safe. A value that fails
//! to serialize is not cached; a cached value that fails to deserialize is
//! evicted and treated as a miss. Either way the caller falls through to
//! the primary store and the operation still succeeds.

use std::sync::Arc;

use tracing::warn;
use tracker_core::{EntityId, TrackerResult};

use super::key::CacheKey;
use super::traits::{CacheBackend, CacheStats, CacheableEntity};

/// Shared handle to the cache. Cloning shares the backend.
#[derive(Clone)]
pub struct EntityCache {
    backend: Arc<dyn CacheBackend>,
}

impl EntityCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Get a typed value by entity ID.
    pub fn get<T: CacheableEntity>(&self, entity_id: EntityId) -> TrackerResult<Option<T>> {
        let key = CacheKey::new(T::entity_type(), T::namespace(), entity_id);
        let Some(raw) = self.backend.get_raw(&key)? else {
            return Ok(None);
        };
        match serde_json::from_value(raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(%key, error = %err, "evicting undecodable cache entry");
                self.backend.evict(&key)?;
                Ok(None)
            }
        }
    }

    /// Cache a value under its own key. Serialization failure degrades to
    /// not caching.
    pub fn put<T: CacheableEntity>(&self, value: &T) -> TrackerResult<()> {
        let key = value.cache_key();
        match serde_json::to_value(value) {
            Ok(raw) => self.backend.put_raw(key, raw),
            Err(err) => {
                warn!(%key, error = %err, "skipping cache of unserializable value");
                Ok(())
            }
        }
    }

    pub fn evict(&self, key: &CacheKey) -> TrackerResult<()> {
        self.backend.evict(key)
    }

    pub fn evict_many(&self, keys: &[CacheKey]) -> TrackerResult<()> {
        self.backend.evict_many(keys)
    }

    pub fn clear(&self) -> TrackerResult<()> {
        self.backend.clear()
    }

    pub fn stats(&self) -> CacheStats {
        self.backend.stats()
    }
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("stats", &self.backend.stats())
            .finish()
    }
}
