//! Cache layer for derived read views with explicit eviction contracts.
//!
//! The cache is a pure read acceleration layer over the primary store:
//! a cold cache never changes observable behavior, only latency. Every
//! write path is responsible for evicting exactly the keys it stales,
//! synchronously, before the mutating call returns.
//!
//! # Namespaces
//!
//! Two cached shapes exist per entity ID: the entity itself
//! ([`CacheNamespace::Entity`]) and its composed detail view
//! ([`CacheNamespace::Detail`]). Detail views embed data from related
//! entities, so relationship changes must evict the detail keys of every
//! affected entity, not just the mutated one.
//!
//! # Degradation
//!
//! The cache never makes an operation fail: a value that cannot be
//! serialized or deserialized is treated as a miss and logged, and the
//! caller falls through to the primary store.

pub mod entity_cache;
pub mod key;
pub mod memory;
pub mod traits;

pub use entity_cache::EntityCache;
pub use key::{CacheKey, CacheNamespace};
pub use memory::InMemoryCacheBackend;
pub use traits::{CacheBackend, CacheStats, CacheableEntity};
