//! Error types for the service layer.
//!
//! Service operations return [`ServiceError`], a structured error with a
//! machine-readable [`ErrorCode`] plus a human-readable message and
//! optional details. Storage and validation errors from the lower layers
//! are mapped into it at the service boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use tracker_core::{StorageError, TrackerError, ValidationError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for service responses.
///
/// Each code represents a category of failure a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Requested entity does not exist
    NotFound,

    /// Request validation failed
    ValidationFailed,

    /// Uniqueness or state conflict with existing data
    Conflict,

    /// Storage or other internal failure
    InternalFailure,
}

impl ErrorCode {
    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "Entity not found",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::Conflict => "Conflict with existing data",
            ErrorCode::InternalFailure => "Internal failure",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// SERVICE ERROR STRUCT
// ============================================================================

/// Structured error returned by all service operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (field errors, offending values)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalFailure, message)
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::NotFound { .. } | StorageError::AuditEntryNotFound { .. } => {
                Self::not_found(err.to_string())
            }
            StorageError::Conflict {
                field, value, ..
            } => Self::conflict(err.to_string()).with_details(serde_json::json!({
                "field": field,
                "value": value,
            })),
            StorageError::InsertFailed { .. }
            | StorageError::UpdateFailed { .. }
            | StorageError::AppendFailed { .. }
            | StorageError::LockPoisoned => Self::internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string()).with_details(serde_json::json!({
            "field": err.field(),
        }))
    }
}

impl From<TrackerError> for ServiceError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Storage(e) => e.into(),
            TrackerError::Validation(e) => e.into(),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
