//! Core entity structures

use crate::{
    new_entity_id, AuditAction, EntityId, EntityType, ProjectStatus, TaskStatus, Timestamp,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Project - top-level container for tasks.
/// Deleting a project cascade-deletes its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: EntityId,
    /// Unique across the store, case-insensitively.
    pub name: String,
    pub description: Option<String>,
    pub deadline: Timestamp,
    pub status: ProjectStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn new(name: &str, description: Option<&str>, deadline: Timestamp) -> Self {
        let now = Utc::now();
        Self {
            project_id: new_entity_id(),
            name: name.to_string(),
            description: description.map(str::to_string),
            deadline,
            status: ProjectStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overdue means the deadline has passed while the project is still open.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.status.is_open() && self.deadline < now
    }
}

/// Developer - can be assigned to tasks, never owns them.
/// Deleting a developer unassigns, not deletes, its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Developer {
    pub developer_id: EntityId,
    pub name: String,
    /// Unique across the store.
    pub email: String,
    /// Normalized at write time: trimmed, lower-cased, empties dropped.
    pub skills: BTreeSet<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Developer {
    pub fn new(name: &str, email: &str, skills: impl IntoIterator<Item = String>) -> Self {
        let now = Utc::now();
        Self {
            developer_id: new_entity_id(),
            name: name.to_string(),
            email: email.to_string(),
            skills: normalize_skills(skills),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a skill in normalized form. Blank input is a no-op.
    pub fn add_skill(&mut self, skill: &str) {
        if let Some(s) = normalize_skill(skill) {
            self.skills.insert(s);
        }
    }

    /// Remove a skill, matching its normalized form.
    pub fn remove_skill(&mut self, skill: &str) {
        if let Some(s) = normalize_skill(skill) {
            self.skills.remove(&s);
        }
    }

    /// Replace the whole skill set with the normalized form of `skills`.
    pub fn set_skills(&mut self, skills: impl IntoIterator<Item = String>) {
        self.skills = normalize_skills(skills);
    }
}

/// Normalize a single skill: trim + lowercase, `None` if blank.
pub fn normalize_skill(skill: &str) -> Option<String> {
    let s = skill.trim().to_lowercase();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Normalize a collection of skills into a deduplicated set.
pub fn normalize_skills(skills: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    skills
        .into_iter()
        .filter_map(|s| normalize_skill(&s))
        .collect()
}

/// Task - unit of work inside a project, optionally assigned to a developer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<Timestamp>,
    /// Must reference an existing project at write time.
    pub project_id: EntityId,
    pub assigned_developer_id: Option<EntityId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn new(title: &str, description: Option<&str>, project_id: EntityId) -> Self {
        let now = Utc::now();
        Self {
            task_id: new_entity_id(),
            title: title.to_string(),
            description: description.map(str::to_string),
            status: TaskStatus::default(),
            due_date: None,
            project_id,
            assigned_developer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overdue means the due date has passed and the task is not completed.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        match self.due_date {
            Some(due) => self.status != TaskStatus::Completed && due < now,
            None => false,
        }
    }
}

/// One immutable record in the audit log store.
///
/// `entity_id` is `None` for multi-entity actions (bulk operations) and for
/// recorded authentication failures. Entries are only ever removed by
/// age-based retention cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub entry_id: EntityId,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Option<EntityId>,
    /// Server time at append.
    pub timestamp: Timestamp,
    pub actor: String,
    /// Free-form key/value snapshot, e.g. `{oldData, newData}` for updates.
    pub payload: serde_json::Value,
}

impl AuditEntry {
    pub fn new(
        action: AuditAction,
        entity_type: EntityType,
        entity_id: Option<EntityId>,
        actor: &str,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            entry_id: new_entity_id(),
            action,
            entity_type,
            entity_id,
            timestamp: Utc::now(),
            actor: actor.to_string(),
            payload,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_project_defaults_to_planning() {
        let p = Project::new("Apollo", None, Utc::now() + Duration::days(30));
        assert_eq!(p.status, ProjectStatus::Planning);
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn test_project_overdue_ignores_closed_statuses() {
        let mut p = Project::new("Apollo", None, Utc::now() - Duration::days(1));
        assert!(p.is_overdue(Utc::now()));
        p.status = ProjectStatus::Completed;
        assert!(!p.is_overdue(Utc::now()));
    }

    #[test]
    fn test_skill_normalization_on_construction() {
        let d = Developer::new(
            "Ada",
            "ada@example.com",
            vec!["  Rust ".to_string(), "rust".to_string(), " ".to_string()],
        );
        assert_eq!(d.skills.len(), 1);
        assert!(d.skills.contains("rust"));
    }

    #[test]
    fn test_add_and_remove_skill_are_case_insensitive() {
        let mut d = Developer::new("Ada", "ada@example.com", vec![]);
        d.add_skill("Java");
        assert!(d.skills.contains("java"));
        d.remove_skill(" JAVA ");
        assert!(d.skills.is_empty());
    }

    #[test]
    fn test_task_overdue_requires_due_date() {
        let mut t = Task::new("Wire codec", None, new_entity_id());
        assert!(!t.is_overdue(Utc::now()));
        t.due_date = Some(Utc::now() - Duration::hours(1));
        assert!(t.is_overdue(Utc::now()));
        t.status = TaskStatus::Completed;
        assert!(!t.is_overdue(Utc::now()));
    }

    #[test]
    fn test_audit_entry_stamps_server_time() {
        let before = Utc::now();
        let entry = AuditEntry::new(
            AuditAction::Create,
            EntityType::Project,
            Some(new_entity_id()),
            "alice",
            serde_json::json!({"name": "Apollo"}),
        );
        assert!(entry.timestamp >= before);
        assert_eq!(entry.actor, "alice");
    }
}
