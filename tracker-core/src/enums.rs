//! Enum types for tracker entities
//!
//! All discriminators are closed enums and are matched exhaustively by
//! callers; there are no fallthrough string branches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENTITY / ACTION DISCRIMINATORS
// ============================================================================

/// Entity type discriminator for audit records and cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Project,
    Task,
    Developer,
}

impl EntityType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            EntityType::Project => "PROJECT",
            EntityType::Task => "TASK",
            EntityType::Developer => "DEVELOPER",
        }
    }

    /// All entity types, for statistics breakdowns.
    pub fn all() -> [EntityType; 3] {
        [EntityType::Project, EntityType::Task, EntityType::Developer]
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Kind of mutation recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }

    pub fn all() -> [AuditAction; 3] {
        [AuditAction::Create, AuditAction::Update, AuditAction::Delete]
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// ============================================================================
// PROJECT STATUS
// ============================================================================

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Planning,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "PLANNING",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::OnHold => "ON_HOLD",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, ProjectStatusParseError> {
        match s.to_uppercase().as_str() {
            "PLANNING" => Ok(ProjectStatus::Planning),
            "IN_PROGRESS" => Ok(ProjectStatus::InProgress),
            "ON_HOLD" => Ok(ProjectStatus::OnHold),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            "CANCELLED" => Ok(ProjectStatus::Cancelled),
            _ => Err(ProjectStatusParseError(s.to_string())),
        }
    }

    pub fn all() -> [ProjectStatus; 5] {
        [
            ProjectStatus::Planning,
            ProjectStatus::InProgress,
            ProjectStatus::OnHold,
            ProjectStatus::Completed,
            ProjectStatus::Cancelled,
        ]
    }

    /// Whether a project in this status still counts against deadlines.
    pub fn is_open(&self) -> bool {
        !matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ProjectStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid project status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectStatusParseError(pub String);

impl fmt::Display for ProjectStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid project status: {}", self.0)
    }
}

impl std::error::Error for ProjectStatusParseError {}

// ============================================================================
// TASK STATUS
// ============================================================================

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    InReview,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::InReview => "IN_REVIEW",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Blocked => "BLOCKED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, TaskStatusParseError> {
        match s.to_uppercase().as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "IN_REVIEW" => Ok(TaskStatus::InReview),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "BLOCKED" => Ok(TaskStatus::Blocked),
            _ => Err(TaskStatusParseError(s.to_string())),
        }
    }

    pub fn all() -> [TaskStatus; 5] {
        [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::InReview,
            TaskStatus::Completed,
            TaskStatus::Blocked,
        ]
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid task status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatusParseError(pub String);

impl fmt::Display for TaskStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid task status: {}", self.0)
    }
}

impl std::error::Error for TaskStatusParseError {}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_status_roundtrip() {
        for status in ProjectStatus::all() {
            assert_eq!(ProjectStatus::from_db_str(status.as_db_str()), Ok(status));
        }
    }

    #[test]
    fn test_task_status_roundtrip() {
        for status in TaskStatus::all() {
            assert_eq!(TaskStatus::from_db_str(status.as_db_str()), Ok(status));
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            ProjectStatus::from_db_str("in_progress"),
            Ok(ProjectStatus::InProgress)
        );
        assert_eq!(TaskStatus::from_db_str("todo"), Ok(TaskStatus::Todo));
    }

    #[test]
    fn test_invalid_status_is_rejected() {
        assert!(ProjectStatus::from_db_str("SHIPPED").is_err());
        assert!(TaskStatus::from_db_str("DONE").is_err());
    }

    #[test]
    fn test_serde_wire_format_is_screaming_snake() {
        let json = serde_json::to_string(&TaskStatus::InReview).unwrap();
        assert_eq!(json, "\"IN_REVIEW\"");
        let json = serde_json::to_string(&EntityType::Developer).unwrap();
        assert_eq!(json, "\"DEVELOPER\"");
        let json = serde_json::to_string(&AuditAction::Create).unwrap();
        assert_eq!(json, "\"CREATE\"");
    }

    #[test]
    fn test_open_project_statuses() {
        assert!(ProjectStatus::Planning.is_open());
        assert!(ProjectStatus::OnHold.is_open());
        assert!(!ProjectStatus::Completed.is_open());
        assert!(!ProjectStatus::Cancelled.is_open());
    }
}
