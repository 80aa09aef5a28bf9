//! Cache backend trait and cacheable entity marker.

use serde::{de::DeserializeOwned, Serialize};
use tracker_core::{EntityId, EntityType, TrackerResult};

use super::key::{CacheKey, CacheNamespace};

/// Marker trait for types that can be cached under an entity key.
///
/// `entity_type()` must return a consistent value for all instances of the
/// type; `entity_id()` is the instance's unique identifier. `namespace()`
/// defaults to [`CacheNamespace::Entity`]; detail-view types override it.
pub trait CacheableEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Entity type this cacheable belongs to.
    fn entity_type() -> EntityType;

    /// Which cached shape this type represents.
    fn namespace() -> CacheNamespace {
        CacheNamespace::Entity
    }

    /// Unique identifier of this instance.
    fn entity_id(&self) -> EntityId;

    /// The key this instance is stored under.
    fn cache_key(&self) -> CacheKey {
        CacheKey::new(Self::entity_type(), Self::namespace(), self.entity_id())
    }
}

/// Pluggable cache backend over pre-serialized values.
///
/// The raw API keeps the trait object-safe; typed access goes through
/// [`super::EntityCache`], which owns serialization. Implementations must
/// be thread-safe, and eviction of an absent key must be a silent no-op.
pub trait CacheBackend: Send + Sync {
    /// Get a raw cached value.
    fn get_raw(&self, key: &CacheKey) -> TrackerResult<Option<serde_json::Value>>;

    /// Put a raw value, replacing any previous value under the key.
    fn put_raw(&self, key: CacheKey, value: serde_json::Value) -> TrackerResult<()>;

    /// Remove one key. Absent keys are not an error.
    fn evict(&self, key: &CacheKey) -> TrackerResult<()>;

    /// Remove a batch of keys.
    fn evict_many(&self, keys: &[CacheKey]) -> TrackerResult<()> {
        for key in keys {
            self.evict(key)?;
        }
        Ok(())
    }

    /// Drop every cached value.
    fn clear(&self) -> TrackerResult<()>;

    /// Counter snapshot at the time of the call.
    fn stats(&self) -> CacheStats;
}

/// Monotonic cache counters.
///
/// A snapshot, not a live view: counters observed at one instant, already
/// stale by the time the caller reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: u64,
}

impl CacheStats {
    /// Hit rate in [0.0, 1.0]; 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// Entity-record impls for the core entities. Detail-view types live in the
// service layer and implement the trait there with `namespace() = Detail`.

impl CacheableEntity for tracker_core::Project {
    fn entity_type() -> EntityType {
        EntityType::Project
    }

    fn entity_id(&self) -> EntityId {
        self.project_id
    }
}

impl CacheableEntity for tracker_core::Developer {
    fn entity_type() -> EntityType {
        EntityType::Developer
    }

    fn entity_id(&self) -> EntityId {
        self.developer_id
    }
}

impl CacheableEntity for tracker_core::Task {
    fn entity_type() -> EntityType {
        EntityType::Task
    }

    fn entity_id(&self) -> EntityId {
        self.task_id
    }
}
