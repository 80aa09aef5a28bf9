//! Error types for tracker operations

use crate::{EntityId, EntityType};
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: EntityId },

    #[error("Conflict on {entity_type} {field}: '{value}' already exists")]
    Conflict {
        entity_type: EntityType,
        field: &'static str,
        value: String,
    },

    #[error("Insert failed for {entity_type}: {reason}")]
    InsertFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Update failed for {entity_type} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: EntityId,
        reason: String,
    },

    #[error("Audit append failed: {reason}")]
    AppendFailed { reason: String },

    #[error("Audit entry not found with id {id}")]
    AuditEntryNotFound { id: EntityId },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors with field-level detail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    /// The field this error is about, for field-level error reporting.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::RequiredFieldMissing { field } => field,
            ValidationError::InvalidValue { field, .. } => field,
        }
    }
}

/// Master error type for all tracker errors.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Task,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("TASK"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_storage_error_display_conflict() {
        let err = StorageError::Conflict {
            entity_type: EntityType::Developer,
            field: "email",
            value: "ada@example.com".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("email"));
        assert!(msg.contains("ada@example.com"));
    }

    #[test]
    fn test_validation_error_reports_field() {
        let err = ValidationError::InvalidValue {
            field: "name".to_string(),
            reason: "too short".to_string(),
        };
        assert_eq!(err.field(), "name");
        let err = ValidationError::RequiredFieldMissing {
            field: "deadline".to_string(),
        };
        assert_eq!(err.field(), "deadline");
    }

    #[test]
    fn test_tracker_error_from_variants() {
        let storage = TrackerError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, TrackerError::Storage(_)));

        let validation = TrackerError::from(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        });
        assert!(matches!(validation, TrackerError::Validation(_)));
    }
}
