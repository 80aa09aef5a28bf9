//! Task service.
//!
//! Task mutations reach across the entity graph: a task belongs to a
//! project and may be assigned to a developer, so every write computes
//! which detail views it staled (owning project, old assignee, new
//! assignee) and evicts them along with the task's own keys before the
//! call returns.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use tracker_core::{
    resolve_actor, AuditAction, EntityId, EntityType, Page, PageRequest, Task, TaskStatus,
};
use tracker_storage::{CacheKey, EntityCache, PrimaryStore, TaskCriteria, TaskUpdate};

use crate::audit::AuditRecorder;
use crate::error::{ServiceError, ServiceResult};
use crate::project::snapshot;
use crate::types::{CreateTaskRequest, UpdateTaskRequest};

#[derive(Clone)]
pub struct TaskService {
    pub(crate) store: Arc<dyn PrimaryStore>,
    pub(crate) cache: EntityCache,
    pub(crate) audit: AuditRecorder,
}

/// Cache keys staled by a change from `old` to `new` for one task write.
/// Covers the task itself, the owning project(s), and both assignees.
fn staled_keys(old: Option<&Task>, new: Option<&Task>) -> Vec<CacheKey> {
    let mut keys = Vec::new();
    let task_id = old.map(|t| t.task_id).or(new.map(|t| t.task_id));
    if let Some(id) = task_id {
        keys.extend(CacheKey::both(EntityType::Task, id));
    }
    for task in [old, new].into_iter().flatten() {
        keys.push(CacheKey::detail(EntityType::Project, task.project_id));
        if let Some(dev_id) = task.assigned_developer_id {
            keys.push(CacheKey::detail(EntityType::Developer, dev_id));
        }
    }
    keys.dedup();
    keys
}

impl TaskService {
    pub fn new(store: Arc<dyn PrimaryStore>, cache: EntityCache, audit: AuditRecorder) -> Self {
        Self {
            store,
            cache,
            audit,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn create(&self, request: CreateTaskRequest, actor: Option<&str>) -> ServiceResult<Task> {
        request.validate()?;
        let actor = resolve_actor(actor);

        let mut task = Task::new(
            request.title.trim(),
            request.description.as_deref(),
            request.project_id,
        );
        if let Some(status) = request.status {
            task.status = status;
        }
        task.due_date = request.due_date;
        task.assigned_developer_id = request.assigned_developer_id;

        // Referential checks happen inside the insert, before any trace.
        self.store.task_insert(&task)?;
        info!(task_id = %task.task_id, project_id = %task.project_id, "task created");

        self.cache.evict_many(&staled_keys(None, Some(&task)))?;

        self.audit.record(
            AuditAction::Create,
            EntityType::Task,
            Some(task.task_id),
            &actor,
            snapshot(&task),
        );
        Ok(task)
    }

    pub fn update(
        &self,
        id: EntityId,
        request: UpdateTaskRequest,
        actor: Option<&str>,
    ) -> ServiceResult<Task> {
        request.validate()?;
        let actor = resolve_actor(actor);

        let old = self.require(id)?;
        let updated = self.store.task_update(
            id,
            TaskUpdate {
                title: Some(request.title.trim().to_string()),
                description: Some(request.description),
                status: Some(request.status),
                due_date: Some(request.due_date),
                project_id: Some(request.project_id),
                assigned_developer_id: Some(request.assigned_developer_id),
            },
        )?;

        self.cache
            .evict_many(&staled_keys(Some(&old), Some(&updated)))?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Task,
            Some(id),
            &actor,
            json!({
                "oldData": snapshot(&old),
                "newData": snapshot(&updated),
            }),
        );
        Ok(updated)
    }

    pub fn delete(&self, id: EntityId, actor: Option<&str>) -> ServiceResult<()> {
        let actor = resolve_actor(actor);
        let task = self.store.task_delete(id)?;
        info!(task_id = %id, "task deleted");

        self.cache.evict_many(&staled_keys(Some(&task), None))?;

        self.audit.record(
            AuditAction::Delete,
            EntityType::Task,
            Some(id),
            &actor,
            snapshot(&task),
        );
        Ok(())
    }

    /// Assign a task to a developer. The developer must exist.
    pub fn assign(
        &self,
        id: EntityId,
        developer_id: EntityId,
        actor: Option<&str>,
    ) -> ServiceResult<Task> {
        let actor = resolve_actor(actor);
        let old = self.require(id)?;
        let updated = self.store.task_update(
            id,
            TaskUpdate {
                assigned_developer_id: Some(Some(developer_id)),
                ..Default::default()
            },
        )?;

        self.cache
            .evict_many(&staled_keys(Some(&old), Some(&updated)))?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Task,
            Some(id),
            &actor,
            json!({
                "action": "ASSIGN_TASK",
                "taskId": id,
                "oldDeveloperId": old.assigned_developer_id,
                "newDeveloperId": developer_id,
            }),
        );
        Ok(updated)
    }

    /// Remove a task's assignee. A no-op assignment-wise if already
    /// unassigned, but still audited.
    pub fn unassign(&self, id: EntityId, actor: Option<&str>) -> ServiceResult<Task> {
        let actor = resolve_actor(actor);
        let old = self.require(id)?;
        let updated = self.store.task_update(
            id,
            TaskUpdate {
                assigned_developer_id: Some(None),
                ..Default::default()
            },
        )?;

        self.cache
            .evict_many(&staled_keys(Some(&old), Some(&updated)))?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Task,
            Some(id),
            &actor,
            json!({
                "action": "UNASSIGN_TASK",
                "taskId": id,
                "oldDeveloperId": old.assigned_developer_id,
            }),
        );
        Ok(updated)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get(&self, id: EntityId) -> ServiceResult<Task> {
        if let Some(cached) = self.cache.get::<Task>(id)? {
            debug!(task_id = %id, "task served from cache");
            return Ok(cached);
        }
        let task = self.require(id)?;
        self.cache.put(&task)?;
        Ok(task)
    }

    pub fn list(&self) -> ServiceResult<Vec<Task>> {
        let mut tasks = self.store.task_list()?;
        tasks.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(tasks)
    }

    pub fn list_by_project(&self, project_id: EntityId) -> ServiceResult<Vec<Task>> {
        Ok(self.store.task_list_by_project(project_id)?)
    }

    pub fn list_by_developer(&self, developer_id: EntityId) -> ServiceResult<Vec<Task>> {
        Ok(self.store.task_list_by_developer(developer_id)?)
    }

    pub fn list_by_status(&self, status: TaskStatus) -> ServiceResult<Vec<Task>> {
        Ok(self.store.task_list_by_status(status)?)
    }

    pub fn list_unassigned(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.store.task_list_unassigned()?)
    }

    pub fn without_due_date(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.store.task_list_without_due_date()?)
    }

    /// Combined filter query, paginated. Unset criteria match everything.
    pub fn find_by_criteria(
        &self,
        criteria: &TaskCriteria,
        page: PageRequest,
    ) -> ServiceResult<Page<Task>> {
        let mut tasks = self.store.task_find_by_criteria(criteria)?;
        tasks.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(Page::from_items(tasks, &page))
    }

    pub fn search_by_title(&self, term: &str) -> ServiceResult<Vec<Task>> {
        Ok(self.store.task_search_by_title(term)?)
    }

    pub fn overdue(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.store.task_list_overdue(Utc::now())?)
    }

    pub fn due_within(&self, days: i64) -> ServiceResult<Vec<Task>> {
        Ok(self.store.task_list_due_within(Utc::now(), days)?)
    }

    pub(crate) fn require(&self, id: EntityId) -> ServiceResult<Task> {
        self.store
            .task_get(id)?
            .ok_or_else(|| ServiceError::not_found(format!("Task not found with id {id}")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tracker_storage::{
        AuditQuery, AuditStore, InMemoryAuditStore, InMemoryCacheBackend, InMemoryPrimaryStore,
    };
    use tracker_test_utils::{sample_developer, sample_project};

    pub(crate) struct Fixture {
        pub service: TaskService,
        pub store: Arc<InMemoryPrimaryStore>,
        pub audit_store: Arc<InMemoryAuditStore>,
        pub project_id: EntityId,
        pub developer_id: EntityId,
    }

    pub(crate) fn fixture() -> Fixture {
        let store = Arc::new(InMemoryPrimaryStore::new());
        let audit_store = Arc::new(InMemoryAuditStore::new());
        let cache = EntityCache::new(Arc::new(InMemoryCacheBackend::new()));
        let service = TaskService::new(
            store.clone(),
            cache,
            AuditRecorder::new(audit_store.clone()),
        );

        let project = sample_project("Apollo");
        store.project_insert(&project).unwrap();
        let developer = sample_developer("Ada");
        store.developer_insert(&developer).unwrap();

        Fixture {
            service,
            store,
            audit_store,
            project_id: project.project_id,
            developer_id: developer.developer_id,
        }
    }

    fn create_request(project_id: EntityId) -> CreateTaskRequest {
        CreateTaskRequest {
            title: "Write the parser".to_string(),
            description: None,
            status: None,
            due_date: None,
            project_id,
            assigned_developer_id: None,
        }
    }

    #[test]
    fn test_create_in_missing_project_leaves_no_trace() {
        let f = fixture();
        let err = f
            .service
            .create(create_request(tracker_core::new_entity_id()), None)
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotFound);
        assert_eq!(f.audit_store.len().unwrap(), 0);
    }

    #[test]
    fn test_assign_audits_old_and_new_developer() {
        let f = fixture();
        let task = f.service.create(create_request(f.project_id), None).unwrap();
        f.service
            .assign(task.task_id, f.developer_id, Some("alice"))
            .unwrap();

        let entries = f
            .audit_store
            .find(&AuditQuery {
                action: Some(AuditAction::Update),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload["action"], "ASSIGN_TASK");
        assert!(entries[0].payload["oldDeveloperId"].is_null());
        assert_eq!(
            entries[0].payload["newDeveloperId"],
            json!(f.developer_id)
        );
    }

    #[test]
    fn test_assign_to_missing_developer_fails_before_audit() {
        let f = fixture();
        let task = f.service.create(create_request(f.project_id), None).unwrap();
        let before = f.audit_store.len().unwrap();

        let err = f
            .service
            .assign(task.task_id, tracker_core::new_entity_id(), None)
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotFound);
        assert_eq!(f.audit_store.len().unwrap(), before);
    }

    #[test]
    fn test_reassignment_evicts_both_developer_details() {
        let f = fixture();
        let other = sample_developer("Grace");
        f.store.developer_insert(&other).unwrap();

        let task = f.service.create(create_request(f.project_id), None).unwrap();
        f.service.assign(task.task_id, f.developer_id, None).unwrap();

        // Warm both detail keys through the raw cache facade.
        let updated = f.service.get(task.task_id).unwrap();
        assert_eq!(updated.assigned_developer_id, Some(f.developer_id));

        f.service.assign(task.task_id, other.developer_id, None).unwrap();
        let reassigned = f.service.get(task.task_id).unwrap();
        assert_eq!(reassigned.assigned_developer_id, Some(other.developer_id));
    }

    #[test]
    fn test_cached_task_never_stale_after_update() {
        let f = fixture();
        let task = f.service.create(create_request(f.project_id), None).unwrap();
        f.service.get(task.task_id).unwrap();

        f.service
            .update(
                task.task_id,
                UpdateTaskRequest {
                    title: "Rewrite the parser".to_string(),
                    description: None,
                    status: TaskStatus::InProgress,
                    due_date: None,
                    project_id: f.project_id,
                    assigned_developer_id: None,
                },
                None,
            )
            .unwrap();

        let fresh = f.service.get(task.task_id).unwrap();
        assert_eq!(fresh.title, "Rewrite the parser");
        assert_eq!(fresh.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_unassign_clears_and_audits() {
        let f = fixture();
        let mut request = create_request(f.project_id);
        request.assigned_developer_id = Some(f.developer_id);
        let task = f.service.create(request, None).unwrap();

        let updated = f.service.unassign(task.task_id, None).unwrap();
        assert_eq!(updated.assigned_developer_id, None);

        let entries = f
            .audit_store
            .find(&AuditQuery {
                action: Some(AuditAction::Update),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(entries[0].payload["action"], "UNASSIGN_TASK");
        assert_eq!(entries[0].payload["oldDeveloperId"], json!(f.developer_id));
    }

    #[test]
    fn test_delete_audit_carries_snapshot() {
        let f = fixture();
        let task = f.service.create(create_request(f.project_id), None).unwrap();
        f.service.delete(task.task_id, Some("bob")).unwrap();

        let entries = f
            .audit_store
            .find(&AuditQuery {
                action: Some(AuditAction::Delete),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload["title"], "Write the parser");
        assert_eq!(entries[0].actor, "bob");
    }

    #[test]
    fn test_staled_keys_cover_both_sides_of_a_move() {
        let f = fixture();
        let other_project = sample_project("Gemini");
        f.store.project_insert(&other_project).unwrap();

        let mut old = tracker_test_utils::sample_task("t", f.project_id);
        old.assigned_developer_id = Some(f.developer_id);
        let mut new = old.clone();
        new.project_id = other_project.project_id;
        new.assigned_developer_id = None;

        let keys = staled_keys(Some(&old), Some(&new));
        assert!(keys.contains(&CacheKey::detail(EntityType::Project, f.project_id)));
        assert!(keys.contains(&CacheKey::detail(
            EntityType::Project,
            other_project.project_id
        )));
        assert!(keys.contains(&CacheKey::detail(EntityType::Developer, f.developer_id)));
        assert!(keys.contains(&CacheKey::entity(EntityType::Task, old.task_id)));
    }

    #[test]
    fn test_without_due_date_lists_only_undated_tasks() {
        let f = fixture();
        let undated = f.service.create(create_request(f.project_id), None).unwrap();
        let mut dated = create_request(f.project_id);
        dated.title = "Write the docs".to_string();
        dated.due_date = Some(Utc::now() + chrono::Duration::days(3));
        f.service.create(dated, None).unwrap();

        let found = f.service.without_due_date().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task_id, undated.task_id);
    }

    #[test]
    fn test_find_by_criteria_filters_and_paginates() {
        let f = fixture();
        let wanted = f.service.create(create_request(f.project_id), None).unwrap();
        f.service
            .assign(wanted.task_id, f.developer_id, None)
            .unwrap();
        let mut decoy = create_request(f.project_id);
        decoy.title = "Write the docs".to_string();
        f.service.create(decoy, None).unwrap();

        let page = f
            .service
            .find_by_criteria(
                &TaskCriteria {
                    project_id: Some(f.project_id),
                    assigned_developer_id: Some(f.developer_id),
                    title: Some("parser".to_string()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].task_id, wanted.task_id);
    }
}
