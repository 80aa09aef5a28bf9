//! Composite cache keys.
//!
//! A key is (entity type, namespace, entity ID). Keys for different
//! namespaces of the same entity are distinct, so evicting an entity's
//! value never silently leaves its detail view behind: eviction sites
//! name both keys explicitly.

use std::fmt;

use tracker_core::{EntityId, EntityType};

/// Which cached shape of an entity a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// The entity record itself.
    Entity,
    /// The composed detail view (entity plus related data).
    Detail,
}

impl CacheNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Entity => "entity",
            CacheNamespace::Detail => "detail",
        }
    }
}

/// Composite cache key. Construction requires all three parts, so a key
/// can never be ambiguous about which shape it addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    entity_type: EntityType,
    namespace: CacheNamespace,
    entity_id: EntityId,
}

impl CacheKey {
    pub fn new(entity_type: EntityType, namespace: CacheNamespace, entity_id: EntityId) -> Self {
        Self {
            entity_type,
            namespace,
            entity_id,
        }
    }

    /// Entity-record key.
    pub fn entity(entity_type: EntityType, entity_id: EntityId) -> Self {
        Self::new(entity_type, CacheNamespace::Entity, entity_id)
    }

    /// Detail-view key.
    pub fn detail(entity_type: EntityType, entity_id: EntityId) -> Self {
        Self::new(entity_type, CacheNamespace::Detail, entity_id)
    }

    /// Both keys for one entity, for eviction sites that stale everything
    /// about it.
    pub fn both(entity_type: EntityType, entity_id: EntityId) -> [Self; 2] {
        [
            Self::entity(entity_type, entity_id),
            Self::detail(entity_type, entity_id),
        ]
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn namespace(&self) -> CacheNamespace {
        self.namespace
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.entity_type,
            self.namespace.as_str(),
            self.entity_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::new_entity_id;

    #[test]
    fn test_namespaces_are_distinct_keys() {
        let id = new_entity_id();
        let entity = CacheKey::entity(EntityType::Task, id);
        let detail = CacheKey::detail(EntityType::Task, id);
        assert_ne!(entity, detail);
    }

    #[test]
    fn test_both_returns_entity_and_detail() {
        let id = new_entity_id();
        let [a, b] = CacheKey::both(EntityType::Project, id);
        assert_eq!(a.namespace(), CacheNamespace::Entity);
        assert_eq!(b.namespace(), CacheNamespace::Detail);
        assert_eq!(a.entity_id(), id);
        assert_eq!(b.entity_id(), id);
    }

    #[test]
    fn test_display_format() {
        let id = new_entity_id();
        let key = CacheKey::entity(EntityType::Developer, id);
        let rendered = key.to_string();
        assert!(rendered.contains("entity"));
        assert!(rendered.contains(&id.to_string()));
    }
}
