//! Tracker Storage - Storage Traits and In-Memory Implementations
//!
//! Defines the storage abstraction for tracker entities: the transactional
//! primary store (projects, developers, tasks) and the independent append-only
//! audit store, plus the derived cache subsystem.
//!
//! The in-memory primary store gives native atomicity per single-entity write
//! and per set-based bulk statement (each runs under one write lock). Nothing
//! here spans both stores; audit decoupling is the service layer's concern.

pub mod audit_store;
pub mod cache;

pub use audit_store::{AuditQuery, AuditStore, InMemoryAuditStore};
pub use cache::{
    CacheBackend, CacheKey, CacheNamespace, CacheStats, CacheableEntity, EntityCache,
    InMemoryCacheBackend,
};

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracker_core::{
    entities::normalize_skills, Developer, EntityId, EntityType, Project, ProjectStatus,
    StorageError, Task, TaskStatus, Timestamp, TrackerResult,
};

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for projects. Outer `None` = keep the current value;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub deadline: Option<Timestamp>,
    pub status: Option<ProjectStatus>,
}

/// Update payload for developers. `skills` replaces the whole set and is
/// normalized (trim + lowercase) on write.
#[derive(Debug, Clone, Default)]
pub struct DeveloperUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub skills: Option<Vec<String>>,
}

/// Update payload for tasks. Outer `None` = keep; for the clearable fields
/// the inner `None` clears (`assigned_developer_id: Some(None)` unassigns).
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<Timestamp>>,
    pub project_id: Option<EntityId>,
    pub assigned_developer_id: Option<Option<EntityId>>,
}

/// Combined task filter. Every `None` matches everything, so the default
/// criteria match all tasks. Title matching is a case-insensitive
/// substring check.
#[derive(Debug, Clone, Default)]
pub struct TaskCriteria {
    pub project_id: Option<EntityId>,
    pub assigned_developer_id: Option<EntityId>,
    pub status: Option<TaskStatus>,
    pub title: Option<String>,
}

impl TaskCriteria {
    fn matches(&self, task: &Task) -> bool {
        if let Some(project_id) = self.project_id {
            if task.project_id != project_id {
                return false;
            }
        }
        if let Some(developer_id) = self.assigned_developer_id {
            if task.assigned_developer_id != Some(developer_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(title) = &self.title {
            if !task.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// PRIMARY STORE TRAIT
// ============================================================================

/// Primary store for tracker entities.
///
/// Referential checks (task -> project, task -> developer) and uniqueness
/// (project name case-insensitively, developer email) are enforced at write
/// time by implementations.
pub trait PrimaryStore: Send + Sync {
    // === Project Operations ===

    /// Insert a new project. Fails with `Conflict` on duplicate name.
    fn project_insert(&self, project: &Project) -> TrackerResult<()>;

    /// Get a project by ID.
    fn project_get(&self, id: EntityId) -> TrackerResult<Option<Project>>;

    /// Apply an update, returning the updated project.
    fn project_update(&self, id: EntityId, update: ProjectUpdate) -> TrackerResult<Project>;

    /// Delete a project, cascade-deleting its tasks. Returns the deleted
    /// project and the cascaded tasks (for cache eviction by the caller).
    fn project_delete(&self, id: EntityId) -> TrackerResult<(Project, Vec<Task>)>;

    /// List all projects.
    fn project_list(&self) -> TrackerResult<Vec<Project>>;

    /// List projects by status.
    fn project_list_by_status(&self, status: ProjectStatus) -> TrackerResult<Vec<Project>>;

    /// Case-insensitive name substring search.
    fn project_search_by_name(&self, term: &str) -> TrackerResult<Vec<Project>>;

    /// Projects with no tasks.
    fn projects_without_tasks(&self) -> TrackerResult<Vec<Project>>;

    /// Open projects whose deadline has passed.
    fn projects_overdue(&self, now: Timestamp) -> TrackerResult<Vec<Project>>;

    /// Projects whose deadline falls inside the inclusive range.
    fn projects_with_deadline_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> TrackerResult<Vec<Project>>;

    /// Projects created inside the inclusive range.
    fn projects_created_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> TrackerResult<Vec<Project>>;

    // === Developer Operations ===

    /// Insert a new developer. Fails with `Conflict` on duplicate email.
    fn developer_insert(&self, developer: &Developer) -> TrackerResult<()>;

    /// Get a developer by ID.
    fn developer_get(&self, id: EntityId) -> TrackerResult<Option<Developer>>;

    /// Apply an update, returning the updated developer.
    fn developer_update(&self, id: EntityId, update: DeveloperUpdate) -> TrackerResult<Developer>;

    /// Delete a developer, unassigning (never deleting) its tasks. Returns
    /// the deleted developer and the tasks that were unassigned.
    fn developer_delete(&self, id: EntityId) -> TrackerResult<(Developer, Vec<Task>)>;

    /// List all developers.
    fn developer_list(&self) -> TrackerResult<Vec<Developer>>;

    /// Case-insensitive name-or-email substring search.
    fn developer_search(&self, term: &str) -> TrackerResult<Vec<Developer>>;

    /// Developers holding the given (normalized) skill.
    fn developers_by_skill(&self, skill: &str) -> TrackerResult<Vec<Developer>>;

    /// Developers holding at least one of the given (normalized) skills.
    fn developers_by_any_skill(&self, skills: &[String]) -> TrackerResult<Vec<Developer>>;

    /// Developers with no assigned tasks.
    fn developers_without_tasks(&self) -> TrackerResult<Vec<Developer>>;

    /// Developers carrying fewer than `max_tasks` assigned tasks.
    fn developers_available(&self, max_tasks: usize) -> TrackerResult<Vec<Developer>>;

    // === Task Operations ===

    /// Insert a new task. The project must exist; the assignee, when set,
    /// must exist.
    fn task_insert(&self, task: &Task) -> TrackerResult<()>;

    /// Get a task by ID.
    fn task_get(&self, id: EntityId) -> TrackerResult<Option<Task>>;

    /// Get the tasks that exist among `ids`, silently skipping the rest.
    fn task_get_many(&self, ids: &[EntityId]) -> TrackerResult<Vec<Task>>;

    /// Apply an update, returning the updated task. Re-checks referential
    /// integrity when the project or assignee changes.
    fn task_update(&self, id: EntityId, update: TaskUpdate) -> TrackerResult<Task>;

    /// Delete a task, returning it.
    fn task_delete(&self, id: EntityId) -> TrackerResult<Task>;

    /// List all tasks.
    fn task_list(&self) -> TrackerResult<Vec<Task>>;

    /// Tasks belonging to a project.
    fn task_list_by_project(&self, project_id: EntityId) -> TrackerResult<Vec<Task>>;

    /// Tasks assigned to a developer.
    fn task_list_by_developer(&self, developer_id: EntityId) -> TrackerResult<Vec<Task>>;

    /// Tasks in a given status.
    fn task_list_by_status(&self, status: TaskStatus) -> TrackerResult<Vec<Task>>;

    /// Tasks with no assignee.
    fn task_list_unassigned(&self) -> TrackerResult<Vec<Task>>;

    /// Tasks with no due date.
    fn task_list_without_due_date(&self) -> TrackerResult<Vec<Task>>;

    /// Tasks matching every set filter of `criteria`. Unset filters match
    /// everything.
    fn task_find_by_criteria(&self, criteria: &TaskCriteria) -> TrackerResult<Vec<Task>>;

    /// Case-insensitive title substring search.
    fn task_search_by_title(&self, term: &str) -> TrackerResult<Vec<Task>>;

    /// Uncompleted tasks whose due date has passed.
    fn task_list_overdue(&self, now: Timestamp) -> TrackerResult<Vec<Task>>;

    /// Tasks due between `now` and `now + days`.
    fn task_list_due_within(&self, now: Timestamp, days: i64) -> TrackerResult<Vec<Task>>;

    // === Set-Based Bulk Statements ===

    /// Assign every existing task in `task_ids` to `developer_id` in one
    /// statement. Missing ids are silently excluded. Returns the ids that
    /// were updated. The caller validates the developer beforehand.
    fn task_bulk_assign(
        &self,
        task_ids: &[EntityId],
        developer_id: EntityId,
    ) -> TrackerResult<Vec<EntityId>>;

    /// Set the status of every task in a project in one statement.
    /// Returns the ids that were updated.
    fn task_bulk_set_status_by_project(
        &self,
        project_id: EntityId,
        status: TaskStatus,
    ) -> TrackerResult<Vec<EntityId>>;
}

// ============================================================================
// IN-MEMORY PRIMARY STORE
// ============================================================================

fn read<T>(lock: &RwLock<T>) -> TrackerResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StorageError::LockPoisoned.into())
}

fn write<T>(lock: &RwLock<T>) -> TrackerResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StorageError::LockPoisoned.into())
}

/// In-memory primary store.
///
/// Lock order when an operation touches more than one map:
/// projects -> developers -> tasks.
#[derive(Debug, Default)]
pub struct InMemoryPrimaryStore {
    projects: Arc<RwLock<HashMap<EntityId, Project>>>,
    developers: Arc<RwLock<HashMap<EntityId, Developer>>>,
    tasks: Arc<RwLock<HashMap<EntityId, Task>>>,
}

impl InMemoryPrimaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_count(&self) -> usize {
        self.projects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn developer_count(&self) -> usize {
        self.developers.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl PrimaryStore for InMemoryPrimaryStore {
    // === Project Operations ===

    fn project_insert(&self, project: &Project) -> TrackerResult<()> {
        let mut projects = write(&self.projects)?;
        if projects.contains_key(&project.project_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Project,
                reason: "already exists".to_string(),
            }
            .into());
        }
        let lowered = project.name.to_lowercase();
        if projects.values().any(|p| p.name.to_lowercase() == lowered) {
            return Err(StorageError::Conflict {
                entity_type: EntityType::Project,
                field: "name",
                value: project.name.clone(),
            }
            .into());
        }
        projects.insert(project.project_id, project.clone());
        Ok(())
    }

    fn project_get(&self, id: EntityId) -> TrackerResult<Option<Project>> {
        Ok(read(&self.projects)?.get(&id).cloned())
    }

    fn project_update(&self, id: EntityId, update: ProjectUpdate) -> TrackerResult<Project> {
        let mut projects = write(&self.projects)?;
        if let Some(ref name) = update.name {
            let lowered = name.to_lowercase();
            if projects
                .values()
                .any(|p| p.project_id != id && p.name.to_lowercase() == lowered)
            {
                return Err(StorageError::Conflict {
                    entity_type: EntityType::Project,
                    field: "name",
                    value: name.clone(),
                }
                .into());
            }
        }
        let project = projects.get_mut(&id).ok_or(StorageError::NotFound {
            entity_type: EntityType::Project,
            id,
        })?;

        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(description) = update.description {
            project.description = description;
        }
        if let Some(deadline) = update.deadline {
            project.deadline = deadline;
        }
        if let Some(status) = update.status {
            project.status = status;
        }
        project.updated_at = Utc::now();

        Ok(project.clone())
    }

    fn project_delete(&self, id: EntityId) -> TrackerResult<(Project, Vec<Task>)> {
        let mut projects = write(&self.projects)?;
        let mut tasks = write(&self.tasks)?;
        let project = projects.remove(&id).ok_or(StorageError::NotFound {
            entity_type: EntityType::Project,
            id,
        })?;

        // Cascade: the project owns its tasks.
        let cascade_ids: Vec<EntityId> = tasks
            .values()
            .filter(|t| t.project_id == id)
            .map(|t| t.task_id)
            .collect();
        let mut cascaded = Vec::with_capacity(cascade_ids.len());
        for task_id in cascade_ids {
            if let Some(task) = tasks.remove(&task_id) {
                cascaded.push(task);
            }
        }
        Ok((project, cascaded))
    }

    fn project_list(&self) -> TrackerResult<Vec<Project>> {
        Ok(read(&self.projects)?.values().cloned().collect())
    }

    fn project_list_by_status(&self, status: ProjectStatus) -> TrackerResult<Vec<Project>> {
        Ok(read(&self.projects)?
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect())
    }

    fn project_search_by_name(&self, term: &str) -> TrackerResult<Vec<Project>> {
        let lowered = term.to_lowercase();
        Ok(read(&self.projects)?
            .values()
            .filter(|p| p.name.to_lowercase().contains(&lowered))
            .cloned()
            .collect())
    }

    fn projects_without_tasks(&self) -> TrackerResult<Vec<Project>> {
        let projects = read(&self.projects)?;
        let tasks = read(&self.tasks)?;
        Ok(projects
            .values()
            .filter(|p| !tasks.values().any(|t| t.project_id == p.project_id))
            .cloned()
            .collect())
    }

    fn projects_overdue(&self, now: Timestamp) -> TrackerResult<Vec<Project>> {
        Ok(read(&self.projects)?
            .values()
            .filter(|p| p.is_overdue(now))
            .cloned()
            .collect())
    }

    fn projects_with_deadline_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> TrackerResult<Vec<Project>> {
        Ok(read(&self.projects)?
            .values()
            .filter(|p| p.deadline >= start && p.deadline <= end)
            .cloned()
            .collect())
    }

    fn projects_created_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> TrackerResult<Vec<Project>> {
        Ok(read(&self.projects)?
            .values()
            .filter(|p| p.created_at >= start && p.created_at <= end)
            .cloned()
            .collect())
    }

    // === Developer Operations ===

    fn developer_insert(&self, developer: &Developer) -> TrackerResult<()> {
        let mut developers = write(&self.developers)?;
        if developers.contains_key(&developer.developer_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Developer,
                reason: "already exists".to_string(),
            }
            .into());
        }
        if developers.values().any(|d| d.email == developer.email) {
            return Err(StorageError::Conflict {
                entity_type: EntityType::Developer,
                field: "email",
                value: developer.email.clone(),
            }
            .into());
        }
        developers.insert(developer.developer_id, developer.clone());
        Ok(())
    }

    fn developer_get(&self, id: EntityId) -> TrackerResult<Option<Developer>> {
        Ok(read(&self.developers)?.get(&id).cloned())
    }

    fn developer_update(&self, id: EntityId, update: DeveloperUpdate) -> TrackerResult<Developer> {
        let mut developers = write(&self.developers)?;
        if let Some(ref email) = update.email {
            if developers
                .values()
                .any(|d| d.developer_id != id && &d.email == email)
            {
                return Err(StorageError::Conflict {
                    entity_type: EntityType::Developer,
                    field: "email",
                    value: email.clone(),
                }
                .into());
            }
        }
        let developer = developers.get_mut(&id).ok_or(StorageError::NotFound {
            entity_type: EntityType::Developer,
            id,
        })?;

        if let Some(name) = update.name {
            developer.name = name;
        }
        if let Some(email) = update.email {
            developer.email = email;
        }
        if let Some(skills) = update.skills {
            developer.skills = normalize_skills(skills);
        }
        developer.updated_at = Utc::now();

        Ok(developer.clone())
    }

    fn developer_delete(&self, id: EntityId) -> TrackerResult<(Developer, Vec<Task>)> {
        let mut developers = write(&self.developers)?;
        let mut tasks = write(&self.tasks)?;
        let developer = developers.remove(&id).ok_or(StorageError::NotFound {
            entity_type: EntityType::Developer,
            id,
        })?;

        // Tasks are referenced, not owned: unassign them.
        let now = Utc::now();
        let mut unassigned = Vec::new();
        for task in tasks.values_mut() {
            if task.assigned_developer_id == Some(id) {
                task.assigned_developer_id = None;
                task.updated_at = now;
                unassigned.push(task.clone());
            }
        }
        Ok((developer, unassigned))
    }

    fn developer_list(&self) -> TrackerResult<Vec<Developer>> {
        Ok(read(&self.developers)?.values().cloned().collect())
    }

    fn developer_search(&self, term: &str) -> TrackerResult<Vec<Developer>> {
        let lowered = term.to_lowercase();
        Ok(read(&self.developers)?
            .values()
            .filter(|d| {
                d.name.to_lowercase().contains(&lowered)
                    || d.email.to_lowercase().contains(&lowered)
            })
            .cloned()
            .collect())
    }

    fn developers_by_skill(&self, skill: &str) -> TrackerResult<Vec<Developer>> {
        let lowered = skill.trim().to_lowercase();
        Ok(read(&self.developers)?
            .values()
            .filter(|d| d.skills.contains(&lowered))
            .cloned()
            .collect())
    }

    fn developers_by_any_skill(&self, skills: &[String]) -> TrackerResult<Vec<Developer>> {
        let wanted: Vec<String> = skills.iter().map(|s| s.trim().to_lowercase()).collect();
        Ok(read(&self.developers)?
            .values()
            .filter(|d| wanted.iter().any(|s| d.skills.contains(s)))
            .cloned()
            .collect())
    }

    fn developers_without_tasks(&self) -> TrackerResult<Vec<Developer>> {
        let developers = read(&self.developers)?;
        let tasks = read(&self.tasks)?;
        Ok(developers
            .values()
            .filter(|d| {
                !tasks
                    .values()
                    .any(|t| t.assigned_developer_id == Some(d.developer_id))
            })
            .cloned()
            .collect())
    }

    fn developers_available(&self, max_tasks: usize) -> TrackerResult<Vec<Developer>> {
        let developers = read(&self.developers)?;
        let tasks = read(&self.tasks)?;
        Ok(developers
            .values()
            .filter(|d| {
                tasks
                    .values()
                    .filter(|t| t.assigned_developer_id == Some(d.developer_id))
                    .count()
                    < max_tasks
            })
            .cloned()
            .collect())
    }

    // === Task Operations ===

    fn task_insert(&self, task: &Task) -> TrackerResult<()> {
        let projects = read(&self.projects)?;
        let developers = read(&self.developers)?;
        let mut tasks = write(&self.tasks)?;

        if tasks.contains_key(&task.task_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Task,
                reason: "already exists".to_string(),
            }
            .into());
        }
        if !projects.contains_key(&task.project_id) {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Project,
                id: task.project_id,
            }
            .into());
        }
        if let Some(dev_id) = task.assigned_developer_id {
            if !developers.contains_key(&dev_id) {
                return Err(StorageError::NotFound {
                    entity_type: EntityType::Developer,
                    id: dev_id,
                }
                .into());
            }
        }
        tasks.insert(task.task_id, task.clone());
        Ok(())
    }

    fn task_get(&self, id: EntityId) -> TrackerResult<Option<Task>> {
        Ok(read(&self.tasks)?.get(&id).cloned())
    }

    fn task_get_many(&self, ids: &[EntityId]) -> TrackerResult<Vec<Task>> {
        let tasks = read(&self.tasks)?;
        Ok(ids.iter().filter_map(|id| tasks.get(id).cloned()).collect())
    }

    fn task_update(&self, id: EntityId, update: TaskUpdate) -> TrackerResult<Task> {
        let projects = read(&self.projects)?;
        let developers = read(&self.developers)?;
        let mut tasks = write(&self.tasks)?;

        if let Some(project_id) = update.project_id {
            if !projects.contains_key(&project_id) {
                return Err(StorageError::NotFound {
                    entity_type: EntityType::Project,
                    id: project_id,
                }
                .into());
            }
        }
        if let Some(Some(dev_id)) = update.assigned_developer_id {
            if !developers.contains_key(&dev_id) {
                return Err(StorageError::NotFound {
                    entity_type: EntityType::Developer,
                    id: dev_id,
                }
                .into());
            }
        }

        let task = tasks.get_mut(&id).ok_or(StorageError::NotFound {
            entity_type: EntityType::Task,
            id,
        })?;

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        if let Some(project_id) = update.project_id {
            task.project_id = project_id;
        }
        if let Some(assignee) = update.assigned_developer_id {
            task.assigned_developer_id = assignee;
        }
        task.updated_at = Utc::now();

        Ok(task.clone())
    }

    fn task_delete(&self, id: EntityId) -> TrackerResult<Task> {
        let mut tasks = write(&self.tasks)?;
        tasks.remove(&id).ok_or(
            StorageError::NotFound {
                entity_type: EntityType::Task,
                id,
            }
            .into(),
        )
    }

    fn task_list(&self) -> TrackerResult<Vec<Task>> {
        Ok(read(&self.tasks)?.values().cloned().collect())
    }

    fn task_list_by_project(&self, project_id: EntityId) -> TrackerResult<Vec<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    fn task_list_by_developer(&self, developer_id: EntityId) -> TrackerResult<Vec<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.assigned_developer_id == Some(developer_id))
            .cloned()
            .collect())
    }

    fn task_list_by_status(&self, status: TaskStatus) -> TrackerResult<Vec<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect())
    }

    fn task_list_unassigned(&self) -> TrackerResult<Vec<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.assigned_developer_id.is_none())
            .cloned()
            .collect())
    }

    fn task_list_without_due_date(&self) -> TrackerResult<Vec<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.due_date.is_none())
            .cloned()
            .collect())
    }

    fn task_find_by_criteria(&self, criteria: &TaskCriteria) -> TrackerResult<Vec<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| criteria.matches(t))
            .cloned()
            .collect())
    }

    fn task_search_by_title(&self, term: &str) -> TrackerResult<Vec<Task>> {
        let lowered = term.to_lowercase();
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.title.to_lowercase().contains(&lowered))
            .cloned()
            .collect())
    }

    fn task_list_overdue(&self, now: Timestamp) -> TrackerResult<Vec<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.is_overdue(now))
            .cloned()
            .collect())
    }

    fn task_list_due_within(&self, now: Timestamp, days: i64) -> TrackerResult<Vec<Task>> {
        let end = now + chrono::Duration::days(days);
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.due_date.is_some_and(|due| due >= now && due <= end))
            .cloned()
            .collect())
    }

    // === Set-Based Bulk Statements ===

    fn task_bulk_assign(
        &self,
        task_ids: &[EntityId],
        developer_id: EntityId,
    ) -> TrackerResult<Vec<EntityId>> {
        let mut tasks = write(&self.tasks)?;
        let now = Utc::now();
        let mut updated = Vec::new();
        for id in task_ids {
            if let Some(task) = tasks.get_mut(id) {
                task.assigned_developer_id = Some(developer_id);
                task.updated_at = now;
                updated.push(*id);
            }
        }
        Ok(updated)
    }

    fn task_bulk_set_status_by_project(
        &self,
        project_id: EntityId,
        status: TaskStatus,
    ) -> TrackerResult<Vec<EntityId>> {
        let mut tasks = write(&self.tasks)?;
        let now = Utc::now();
        let mut updated = Vec::new();
        for task in tasks.values_mut() {
            if task.project_id == project_id {
                task.status = status;
                task.updated_at = now;
                updated.push(task.task_id);
            }
        }
        Ok(updated)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tracker_core::TrackerError;

    fn make_project(name: &str) -> Project {
        Project::new(name, Some("test project"), Utc::now() + Duration::days(30))
    }

    fn make_developer(email: &str) -> Developer {
        Developer::new("Dev", email, vec!["rust".to_string()])
    }

    fn make_task(project_id: EntityId) -> Task {
        Task::new("Test task", None, project_id)
    }

    fn store_with_project() -> (InMemoryPrimaryStore, Project) {
        let store = InMemoryPrimaryStore::new();
        let project = make_project("Apollo");
        store.project_insert(&project).unwrap();
        (store, project)
    }

    // ========================================================================
    // Project Tests
    // ========================================================================

    #[test]
    fn test_project_insert_get() {
        let (store, project) = store_with_project();
        let retrieved = store.project_get(project.project_id).unwrap();
        assert_eq!(retrieved.unwrap().name, "Apollo");
    }

    #[test]
    fn test_project_duplicate_name_case_insensitive() {
        let (store, _) = store_with_project();
        let dup = make_project("APOLLO");
        let err = store.project_insert(&dup).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Storage(StorageError::Conflict { field: "name", .. })
        ));
    }

    #[test]
    fn test_project_update_rejects_stolen_name() {
        let (store, _) = store_with_project();
        let other = make_project("Gemini");
        store.project_insert(&other).unwrap();

        let err = store
            .project_update(
                other.project_id,
                ProjectUpdate {
                    name: Some("apollo".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Storage(StorageError::Conflict { .. })
        ));

        // Keeping your own name is not a conflict.
        let updated = store
            .project_update(
                other.project_id,
                ProjectUpdate {
                    name: Some("Gemini".to_string()),
                    status: Some(ProjectStatus::InProgress),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, ProjectStatus::InProgress);
    }

    #[test]
    fn test_project_delete_cascades_tasks() {
        let (store, project) = store_with_project();
        let t1 = make_task(project.project_id);
        let t2 = make_task(project.project_id);
        store.task_insert(&t1).unwrap();
        store.task_insert(&t2).unwrap();

        let (deleted, cascaded) = store.project_delete(project.project_id).unwrap();
        assert_eq!(deleted.project_id, project.project_id);
        assert_eq!(cascaded.len(), 2);
        assert_eq!(store.task_count(), 0);
    }

    #[test]
    fn test_projects_overdue() {
        let store = InMemoryPrimaryStore::new();
        let mut late = make_project("Late");
        late.deadline = Utc::now() - Duration::days(1);
        let mut done = make_project("Done");
        done.deadline = Utc::now() - Duration::days(1);
        done.status = ProjectStatus::Completed;
        store.project_insert(&late).unwrap();
        store.project_insert(&done).unwrap();

        let overdue = store.projects_overdue(Utc::now()).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].name, "Late");
    }

    // ========================================================================
    // Developer Tests
    // ========================================================================

    #[test]
    fn test_developer_duplicate_email() {
        let store = InMemoryPrimaryStore::new();
        store.developer_insert(&make_developer("a@x.com")).unwrap();
        let err = store
            .developer_insert(&make_developer("a@x.com"))
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Storage(StorageError::Conflict { field: "email", .. })
        ));
    }

    #[test]
    fn test_developer_update_normalizes_skills() {
        let store = InMemoryPrimaryStore::new();
        let dev = make_developer("a@x.com");
        store.developer_insert(&dev).unwrap();

        let updated = store
            .developer_update(
                dev.developer_id,
                DeveloperUpdate {
                    skills: Some(vec!["  Java ".to_string(), "JAVA".to_string()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.skills.len(), 1);
        assert!(updated.skills.contains("java"));
    }

    #[test]
    fn test_developer_delete_unassigns_tasks() {
        let (store, project) = store_with_project();
        let dev = make_developer("a@x.com");
        store.developer_insert(&dev).unwrap();

        for _ in 0..3 {
            let mut task = make_task(project.project_id);
            task.assigned_developer_id = Some(dev.developer_id);
            store.task_insert(&task).unwrap();
        }

        let (_, unassigned) = store.developer_delete(dev.developer_id).unwrap();
        assert_eq!(unassigned.len(), 3);
        assert_eq!(store.task_count(), 3);
        assert!(store
            .task_list()
            .unwrap()
            .iter()
            .all(|t| t.assigned_developer_id.is_none()));
    }

    #[test]
    fn test_developers_by_skill_is_normalized() {
        let store = InMemoryPrimaryStore::new();
        store.developer_insert(&make_developer("a@x.com")).unwrap();
        let found = store.developers_by_skill(" RUST ").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_developers_by_any_skill_matches_one_of_the_list() {
        let store = InMemoryPrimaryStore::new();
        store.developer_insert(&make_developer("a@x.com")).unwrap();
        let other = Developer::new("Dev", "b@x.com", vec!["go".to_string()]);
        store.developer_insert(&other).unwrap();

        let found = store
            .developers_by_any_skill(&["RUST ".to_string(), "python".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "a@x.com");
    }

    #[test]
    fn test_developers_available_respects_task_cap() {
        let (store, project) = store_with_project();
        let busy = make_developer("busy@x.com");
        let free = Developer::new("Dev", "free@x.com", vec![]);
        store.developer_insert(&busy).unwrap();
        store.developer_insert(&free).unwrap();
        for _ in 0..2 {
            let mut task = make_task(project.project_id);
            task.assigned_developer_id = Some(busy.developer_id);
            store.task_insert(&task).unwrap();
        }

        let available = store.developers_available(2).unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].email, "free@x.com");
    }

    // ========================================================================
    // Task Tests
    // ========================================================================

    #[test]
    fn test_task_insert_requires_project() {
        let store = InMemoryPrimaryStore::new();
        let task = make_task(tracker_core::new_entity_id());
        let err = store.task_insert(&task).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Storage(StorageError::NotFound {
                entity_type: EntityType::Project,
                ..
            })
        ));
    }

    #[test]
    fn test_task_insert_requires_existing_assignee() {
        let (store, project) = store_with_project();
        let mut task = make_task(project.project_id);
        task.assigned_developer_id = Some(tracker_core::new_entity_id());
        let err = store.task_insert(&task).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Storage(StorageError::NotFound {
                entity_type: EntityType::Developer,
                ..
            })
        ));
    }

    #[test]
    fn test_task_update_clears_assignee() {
        let (store, project) = store_with_project();
        let dev = make_developer("a@x.com");
        store.developer_insert(&dev).unwrap();
        let mut task = make_task(project.project_id);
        task.assigned_developer_id = Some(dev.developer_id);
        store.task_insert(&task).unwrap();

        let updated = store
            .task_update(
                task.task_id,
                TaskUpdate {
                    assigned_developer_id: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.assigned_developer_id, None);
    }

    #[test]
    fn test_task_get_many_skips_missing() {
        let (store, project) = store_with_project();
        let task = make_task(project.project_id);
        store.task_insert(&task).unwrap();

        let found = store
            .task_get_many(&[task.task_id, tracker_core::new_entity_id()])
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_task_due_within_window() {
        let (store, project) = store_with_project();
        let mut soon = make_task(project.project_id);
        soon.due_date = Some(Utc::now() + Duration::days(2));
        let mut later = make_task(project.project_id);
        later.due_date = Some(Utc::now() + Duration::days(20));
        store.task_insert(&soon).unwrap();
        store.task_insert(&later).unwrap();

        let due = store.task_list_due_within(Utc::now(), 7).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].task_id, soon.task_id);
    }

    #[test]
    fn test_task_list_without_due_date() {
        let (store, project) = store_with_project();
        let undated = make_task(project.project_id);
        let mut dated = make_task(project.project_id);
        dated.due_date = Some(Utc::now() + Duration::days(3));
        store.task_insert(&undated).unwrap();
        store.task_insert(&dated).unwrap();

        let found = store.task_list_without_due_date().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task_id, undated.task_id);
    }

    #[test]
    fn test_task_find_by_criteria_combines_filters() {
        let (store, project) = store_with_project();
        let dev = make_developer("a@x.com");
        store.developer_insert(&dev).unwrap();

        let mut wanted = Task::new("Write the parser", None, project.project_id);
        wanted.assigned_developer_id = Some(dev.developer_id);
        wanted.status = TaskStatus::InProgress;
        store.task_insert(&wanted).unwrap();
        let mut decoy = Task::new("Write the docs", None, project.project_id);
        decoy.status = TaskStatus::InProgress;
        store.task_insert(&decoy).unwrap();

        let found = store
            .task_find_by_criteria(&TaskCriteria {
                project_id: Some(project.project_id),
                assigned_developer_id: Some(dev.developer_id),
                status: Some(TaskStatus::InProgress),
                title: Some("PARSER".to_string()),
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task_id, wanted.task_id);

        // Default criteria match everything.
        let all = store.task_find_by_criteria(&TaskCriteria::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    // ========================================================================
    // Bulk Statement Tests
    // ========================================================================

    #[test]
    fn test_bulk_assign_excludes_missing_ids() {
        let (store, project) = store_with_project();
        let dev = make_developer("a@x.com");
        store.developer_insert(&dev).unwrap();

        let t1 = make_task(project.project_id);
        let t2 = make_task(project.project_id);
        store.task_insert(&t1).unwrap();
        store.task_insert(&t2).unwrap();

        let requested = vec![
            t1.task_id,
            t2.task_id,
            tracker_core::new_entity_id(),
            tracker_core::new_entity_id(),
        ];
        let updated = store
            .task_bulk_assign(&requested, dev.developer_id)
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert!(store
            .task_get(t1.task_id)
            .unwrap()
            .unwrap()
            .assigned_developer_id
            .is_some());
    }

    #[test]
    fn test_bulk_set_status_by_project_scopes_to_project() {
        let (store, project) = store_with_project();
        let other = make_project("Gemini");
        store.project_insert(&other).unwrap();

        let mine = make_task(project.project_id);
        let theirs = make_task(other.project_id);
        store.task_insert(&mine).unwrap();
        store.task_insert(&theirs).unwrap();

        let updated = store
            .task_bulk_set_status_by_project(project.project_id, TaskStatus::Blocked)
            .unwrap();
        assert_eq!(updated, vec![mine.task_id]);
        assert_eq!(
            store.task_get(theirs.task_id).unwrap().unwrap().status,
            TaskStatus::Todo
        );
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
