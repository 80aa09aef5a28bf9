//! Tracker Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod page;

pub use entities::{AuditEntry, Developer, Project, Task};
pub use enums::{
    AuditAction, EntityType, ProjectStatus, ProjectStatusParseError, TaskStatus,
    TaskStatusParseError,
};
pub use error::{StorageError, TrackerError, TrackerResult, ValidationError};
pub use identity::{new_entity_id, EntityId, Timestamp};
pub use page::{Page, PageRequest, SortOrder};

/// Actor name recorded when the caller does not supply one.
pub const SYSTEM_ACTOR: &str = "system";

/// Actor name recorded for unauthenticated callers (failed logins).
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// Resolve an optional caller-supplied actor to the recorded actor name.
pub fn resolve_actor(actor: Option<&str>) -> String {
    match actor {
        Some(a) if !a.trim().is_empty() => a.trim().to_string(),
        _ => SYSTEM_ACTOR.to_string(),
    }
}
