//! Request payloads, detail views, and field validation.
//!
//! Validation happens up front in every service operation, before any
//! store write and before any audit entry: a rejected request leaves no
//! trace anywhere.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracker_core::{
    Developer, EntityId, EntityType, Project, ProjectStatus, Task, TaskStatus, Timestamp,
    ValidationError,
};
use tracker_storage::{CacheNamespace, CacheableEntity};

// ============================================================================
// VALIDATION
// ============================================================================

/// Same shape the login form accepts: local@domain.tld, no spaces.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .unwrap_or_else(|_| unreachable!("hardcoded regex"))
});

pub(crate) fn require_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("length must be between {min} and {max} characters"),
        });
    }
    Ok(())
}

pub(crate) fn check_description(value: Option<&str>) -> Result<(), ValidationError> {
    if let Some(desc) = value {
        if desc.chars().count() > 500 {
            return Err(ValidationError::InvalidValue {
                field: "description".to_string(),
                reason: "must be at most 500 characters".to_string(),
            });
        }
    }
    Ok(())
}

pub(crate) fn check_email(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "email".to_string(),
        });
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidValue {
            field: "email".to_string(),
            reason: "not a valid email address".to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// PROJECT REQUESTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub deadline: Timestamp,
    pub status: Option<ProjectStatus>,
}

impl CreateProjectRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_length("name", &self.name, 3, 100)?;
        check_description(self.description.as_deref())
    }
}

/// Full-replacement update, PUT semantics: absent optional fields clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub deadline: Timestamp,
    pub status: ProjectStatus,
}

impl UpdateProjectRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_length("name", &self.name, 3, 100)?;
        check_description(self.description.as_deref())
    }
}

// ============================================================================
// DEVELOPER REQUESTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeveloperRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl CreateDeveloperRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_length("name", &self.name, 2, 50)?;
        check_email(&self.email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDeveloperRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl UpdateDeveloperRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_length("name", &self.name, 2, 50)?;
        check_email(&self.email)
    }
}

// ============================================================================
// TASK REQUESTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Timestamp>,
    pub project_id: EntityId,
    pub assigned_developer_id: Option<EntityId>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_length("title", &self.title, 3, 200)?;
        check_description(self.description.as_deref())
    }
}

/// Full-replacement update, PUT semantics: `due_date: None` clears the due
/// date, `assigned_developer_id: None` unassigns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<Timestamp>,
    pub project_id: EntityId,
    pub assigned_developer_id: Option<EntityId>,
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_length("title", &self.title, 3, 200)?;
        check_description(self.description.as_deref())
    }
}

/// Shared partial spec for the per-item bulk update: only set fields are
/// applied, to every task in the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkTaskUpdate {
    pub status: Option<TaskStatus>,
    pub due_date: Option<Timestamp>,
    pub assigned_developer_id: Option<EntityId>,
}

impl BulkTaskUpdate {
    /// A spec with no set fields changes nothing.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.due_date.is_none() && self.assigned_developer_id.is_none()
    }
}

// ============================================================================
// DETAIL VIEWS
// ============================================================================

/// Condensed task row embedded in detail views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: EntityId,
    pub title: String,
    pub status: TaskStatus,
    pub due_date: Option<Timestamp>,
    pub assigned_developer_id: Option<EntityId>,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.task_id,
            title: task.title.clone(),
            status: task.status,
            due_date: task.due_date,
            assigned_developer_id: task.assigned_developer_id,
        }
    }
}

/// Project plus its tasks. Cached under the Detail namespace, so every
/// task mutation in the project must evict this view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub tasks: Vec<TaskSummary>,
    pub task_count: u64,
    pub completed_task_count: u64,
}

impl ProjectDetail {
    pub fn build(project: Project, tasks: &[Task]) -> Self {
        let completed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count() as u64;
        Self {
            task_count: tasks.len() as u64,
            completed_task_count: completed,
            tasks: tasks.iter().map(TaskSummary::from).collect(),
            project,
        }
    }
}

impl CacheableEntity for ProjectDetail {
    fn entity_type() -> EntityType {
        EntityType::Project
    }

    fn namespace() -> CacheNamespace {
        CacheNamespace::Detail
    }

    fn entity_id(&self) -> EntityId {
        self.project.project_id
    }
}

/// Developer plus current workload. Cached under the Detail namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeveloperDetail {
    pub developer: Developer,
    pub tasks: Vec<TaskSummary>,
    pub open_task_count: u64,
}

impl DeveloperDetail {
    pub fn build(developer: Developer, tasks: &[Task]) -> Self {
        let open = tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Completed)
            .count() as u64;
        Self {
            open_task_count: open,
            tasks: tasks.iter().map(TaskSummary::from).collect(),
            developer,
        }
    }
}

impl CacheableEntity for DeveloperDetail {
    fn entity_type() -> EntityType {
        EntityType::Developer
    }

    fn namespace() -> CacheNamespace {
        CacheNamespace::Detail
    }

    fn entity_id(&self) -> EntityId {
        self.developer.developer_id
    }
}

// ============================================================================
// CLEANUP REPORT
// ============================================================================

/// Outcome of a retention cleanup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub deleted_count: u64,
    pub retention_days: u32,
    pub actor: String,
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn project_request(name: &str) -> CreateProjectRequest {
        CreateProjectRequest {
            name: name.to_string(),
            description: None,
            deadline: Utc::now() + Duration::days(7),
            status: None,
        }
    }

    #[test]
    fn test_project_name_bounds() {
        assert!(project_request("ab").validate().is_err());
        assert!(project_request("abc").validate().is_ok());
        assert!(project_request(&"x".repeat(100)).validate().is_ok());
        assert!(project_request(&"x".repeat(101)).validate().is_err());
    }

    #[test]
    fn test_blank_name_is_missing_not_invalid() {
        let err = project_request("   ").validate().unwrap_err();
        assert!(matches!(err, ValidationError::RequiredFieldMissing { .. }));
    }

    #[test]
    fn test_description_cap() {
        let mut req = project_request("Apollo");
        req.description = Some("d".repeat(500));
        assert!(req.validate().is_ok());
        req.description = Some("d".repeat(501));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(check_email("ada@example.com").is_ok());
        assert!(check_email("  ada@example.com  ").is_ok());
        assert!(check_email("not-an-email").is_err());
        assert!(check_email("a b@example.com").is_err());
        assert!(matches!(
            check_email(""),
            Err(ValidationError::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn test_bulk_task_update_emptiness() {
        assert!(BulkTaskUpdate::default().is_empty());
        let spec = BulkTaskUpdate {
            status: Some(TaskStatus::Blocked),
            ..Default::default()
        };
        assert!(!spec.is_empty());
    }

    #[test]
    fn test_project_detail_counts() {
        let project = Project::new("Apollo", None, Utc::now() + Duration::days(7));
        let mut done = Task::new("done", None, project.project_id);
        done.status = TaskStatus::Completed;
        let open = Task::new("open", None, project.project_id);

        let detail = ProjectDetail::build(project, &[done, open]);
        assert_eq!(detail.task_count, 2);
        assert_eq!(detail.completed_task_count, 1);
    }

    #[test]
    fn test_detail_views_use_detail_namespace() {
        assert_eq!(ProjectDetail::namespace(), CacheNamespace::Detail);
        assert_eq!(DeveloperDetail::namespace(), CacheNamespace::Detail);
        assert_eq!(Project::namespace(), CacheNamespace::Entity);
    }
}
