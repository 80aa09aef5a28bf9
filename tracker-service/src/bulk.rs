//! Bulk mutation coordination.
//!
//! Three shapes with different atomicity:
//! - `bulk_assign` and `bulk_update_status_by_project` are single
//!   set-based statements, atomic over the set.
//! - `bulk_update` is a per-item loop with no cross-item transaction
//!   boundary: a failing item is absorbed silently and earlier items stay
//!   applied. That partial-application behavior is the contract, not an
//!   accident.
//!
//! Exactly one audit entry is written per bulk call, never per item, with
//! a null entity id and a payload naming the full requested id list and
//! the resulting count. The payload records what was requested, not which
//! ids actually changed; failed or missing ids are not excluded.

use serde_json::json;
use tracing::{info, warn};
use tracker_core::{AuditAction, EntityId, EntityType, Task, TaskStatus, resolve_actor};
use tracker_storage::{CacheKey, TaskUpdate};

use crate::error::ServiceResult;
use crate::project::snapshot;
use crate::task::TaskService;
use crate::types::BulkTaskUpdate;

/// Internal ledger of a per-item batch. The external contract collapses
/// this to the succeeded entities; keeping the full shape makes the
/// partial-success semantics observable in tests and logs.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: Vec<EntityId>,
    pub failed: Vec<(EntityId, String)>,
}

impl BatchOutcome {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }
}

impl TaskService {
    /// Assign every existing task in `task_ids` to one developer with a
    /// single set-based statement. Non-existent ids are silently excluded.
    /// Returns the count of tasks that existed and were updated.
    pub fn bulk_assign(
        &self,
        task_ids: &[EntityId],
        developer_id: EntityId,
        actor: Option<&str>,
    ) -> ServiceResult<usize> {
        let actor = resolve_actor(actor);

        // The developer is validated up front; a bad id aborts the whole
        // call before any mutation or audit write.
        if self.store.developer_get(developer_id)?.is_none() {
            return Err(crate::error::ServiceError::not_found(format!(
                "Developer not found with id {developer_id}"
            )));
        }

        // Pre-images, for evicting the previous assignees' detail views.
        let before = self.store.task_get_many(task_ids)?;
        let updated = self.store.task_bulk_assign(task_ids, developer_id)?;
        info!(
            requested = task_ids.len(),
            updated = updated.len(),
            developer_id = %developer_id,
            "bulk assign applied"
        );

        let mut keys = vec![CacheKey::detail(EntityType::Developer, developer_id)];
        for task in &before {
            keys.extend(CacheKey::both(EntityType::Task, task.task_id));
            keys.push(CacheKey::detail(EntityType::Project, task.project_id));
            if let Some(old_dev) = task.assigned_developer_id {
                keys.push(CacheKey::detail(EntityType::Developer, old_dev));
            }
        }
        self.cache.evict_many(&keys)?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Task,
            None,
            &actor,
            json!({
                "action": "BULK_ASSIGN_TASKS",
                "taskIds": task_ids,
                "developerId": developer_id,
                "updatedCount": updated.len(),
            }),
        );
        Ok(updated.len())
    }

    /// Set the status of every task in one project with a single set-based
    /// statement. Returns the affected count.
    pub fn bulk_update_status_by_project(
        &self,
        project_id: EntityId,
        status: TaskStatus,
        actor: Option<&str>,
    ) -> ServiceResult<usize> {
        let actor = resolve_actor(actor);

        if self.store.project_get(project_id)?.is_none() {
            return Err(crate::error::ServiceError::not_found(format!(
                "Project not found with id {project_id}"
            )));
        }

        let before = self.store.task_list_by_project(project_id)?;
        let updated = self
            .store
            .task_bulk_set_status_by_project(project_id, status)?;
        info!(
            project_id = %project_id,
            status = %status,
            updated = updated.len(),
            "bulk status update applied"
        );

        let mut keys = vec![CacheKey::detail(EntityType::Project, project_id)];
        for task in &before {
            keys.extend(CacheKey::both(EntityType::Task, task.task_id));
            if let Some(dev_id) = task.assigned_developer_id {
                keys.push(CacheKey::detail(EntityType::Developer, dev_id));
            }
        }
        self.cache.evict_many(&keys)?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Task,
            None,
            &actor,
            json!({
                "action": "BULK_UPDATE_STATUS_BY_PROJECT",
                "projectId": project_id,
                "status": status,
                "updatedCount": updated.len(),
            }),
        );
        Ok(updated.len())
    }

    /// Apply one shared partial spec to each task, item by item. Not
    /// atomic across the set: item failures are absorbed and earlier items
    /// stay applied. Returns the successfully updated entities. A spec with
    /// no set fields saves nothing and returns an empty list, though the
    /// call is still audited.
    pub fn bulk_update(
        &self,
        task_ids: &[EntityId],
        spec: &BulkTaskUpdate,
        actor: Option<&str>,
    ) -> ServiceResult<Vec<Task>> {
        let actor = resolve_actor(actor);

        let mut outcome = BatchOutcome {
            attempted: task_ids.len(),
            ..Default::default()
        };
        let mut updated_tasks = Vec::new();
        let mut keys = Vec::new();

        // Nothing to apply: no item is touched, but the call is still
        // logged below with updatedCount 0.
        let ids_to_apply: &[EntityId] = if spec.is_empty() { &[] } else { task_ids };

        for &id in ids_to_apply {
            let old = match self.store.task_get(id) {
                Ok(Some(task)) => task,
                Ok(None) => {
                    outcome.failed.push((id, "not found".to_string()));
                    continue;
                }
                Err(err) => {
                    outcome.failed.push((id, err.to_string()));
                    continue;
                }
            };

            let update = TaskUpdate {
                status: spec.status,
                due_date: spec.due_date.map(Some),
                assigned_developer_id: spec.assigned_developer_id.map(Some),
                ..Default::default()
            };
            match self.store.task_update(id, update) {
                Ok(task) => {
                    keys.extend(CacheKey::both(EntityType::Task, id));
                    keys.push(CacheKey::detail(EntityType::Project, task.project_id));
                    for dev_id in [old.assigned_developer_id, task.assigned_developer_id]
                        .into_iter()
                        .flatten()
                    {
                        keys.push(CacheKey::detail(EntityType::Developer, dev_id));
                    }
                    outcome.succeeded.push(id);
                    updated_tasks.push(task);
                }
                Err(err) => {
                    // Absorbed: only the aggregate reaches the caller.
                    warn!(task_id = %id, error = %err, "bulk update item failed");
                    outcome.failed.push((id, err.to_string()));
                }
            }
        }

        self.cache.evict_many(&keys)?;
        info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded_count(),
            failed = outcome.failed.len(),
            "bulk update finished"
        );

        self.audit.record(
            AuditAction::Update,
            EntityType::Task,
            None,
            &actor,
            json!({
                "action": "BULK_UPDATE_TASKS",
                "taskIds": task_ids,
                "updateData": snapshot(spec),
                "updatedCount": updated_tasks.len(),
            }),
        );
        Ok(updated_tasks)
    }
}
