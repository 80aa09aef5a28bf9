//! Project service.
//!
//! Every mutation follows the same order: validate, mutate the primary
//! store, evict the cache keys the write staled, then record the audit
//! entry. Rejected requests (validation, conflict, missing entity) abort
//! before any store or audit write happens.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use tracker_core::{
    resolve_actor, AuditAction, EntityId, EntityType, Project, ProjectStatus, Timestamp,
};
use tracker_storage::{CacheKey, EntityCache, PrimaryStore, ProjectUpdate};

use crate::audit::AuditRecorder;
use crate::error::{ServiceError, ServiceResult};
use crate::types::{CreateProjectRequest, ProjectDetail, UpdateProjectRequest};

/// Snapshot an entity for an audit payload. Serialization of these types
/// cannot fail, but the payload degrades to null rather than erroring.
pub(crate) fn snapshot<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn PrimaryStore>,
    cache: EntityCache,
    audit: AuditRecorder,
}

impl ProjectService {
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

    pub fn create(
        &self,
        request: CreateProjectRequest,
        actor: Option<&str>,
    ) -> ServiceResult<Project> {
        request.validate()?;
        let actor = resolve_actor(actor);

        let mut project = Project::new(
            request.name.trim(),
            request.description.as_deref(),
            request.deadline,
        );
        if let Some(status) = request.status {
            project.status = status;
        }

        self.store.project_insert(&project)?;
        info!(project_id = %project.project_id, name = %project.name, "project created");

        self.audit.record(
            AuditAction::Create,
            EntityType::Project,
            Some(project.project_id),
            &actor,
            snapshot(&project),
        );
        Ok(project)
    }

    pub fn update(
        &self,
        id: EntityId,
        request: UpdateProjectRequest,
        actor: Option<&str>,
    ) -> ServiceResult<Project> {
        request.validate()?;
        let actor = resolve_actor(actor);

        let old = self.require(id)?;
        let updated = self.store.project_update(
            id,
            ProjectUpdate {
                name: Some(request.name.trim().to_string()),
                description: Some(request.description),
                deadline: Some(request.deadline),
                status: Some(request.status),
            },
        )?;

        self.cache.evict_many(&CacheKey::both(EntityType::Project, id))?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Project,
            Some(id),
            &actor,
            json!({
                "oldData": snapshot(&old),
                "newData": snapshot(&updated),
            }),
        );
        Ok(updated)
    }

    /// Delete a project and its tasks. Writes one DELETE entry for the
    /// project; the cascaded tasks are carried in its payload, not logged
    /// individually.
    pub fn delete(&self, id: EntityId, actor: Option<&str>) -> ServiceResult<()> {
        let actor = resolve_actor(actor);
        let (project, cascaded) = self.store.project_delete(id)?;
        info!(
            project_id = %id,
            cascaded_tasks = cascaded.len(),
            "project deleted"
        );

        let mut keys: Vec<CacheKey> = CacheKey::both(EntityType::Project, id).to_vec();
        for task in &cascaded {
            keys.extend(CacheKey::both(EntityType::Task, task.task_id));
            if let Some(dev_id) = task.assigned_developer_id {
                keys.push(CacheKey::detail(EntityType::Developer, dev_id));
            }
        }
        self.cache.evict_many(&keys)?;

        self.audit.record(
            AuditAction::Delete,
            EntityType::Project,
            Some(id),
            &actor,
            json!({
                "project": snapshot(&project),
                "deletedTaskCount": cascaded.len(),
            }),
        );
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get(&self, id: EntityId) -> ServiceResult<Project> {
        if let Some(cached) = self.cache.get::<Project>(id)? {
            debug!(project_id = %id, "project served from cache");
            return Ok(cached);
        }
        let project = self.require(id)?;
        self.cache.put(&project)?;
        Ok(project)
    }

    pub fn get_detail(&self, id: EntityId) -> ServiceResult<ProjectDetail> {
        if let Some(cached) = self.cache.get::<ProjectDetail>(id)? {
            debug!(project_id = %id, "project detail served from cache");
            return Ok(cached);
        }
        let project = self.require(id)?;
        let tasks = self.store.task_list_by_project(id)?;
        let detail = ProjectDetail::build(project, &tasks);
        self.cache.put(&detail)?;
        Ok(detail)
    }

    pub fn list(&self) -> ServiceResult<Vec<Project>> {
        let mut projects = self.store.project_list()?;
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    pub fn list_by_status(&self, status: ProjectStatus) -> ServiceResult<Vec<Project>> {
        let mut projects = self.store.project_list_by_status(status)?;
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    pub fn search_by_name(&self, term: &str) -> ServiceResult<Vec<Project>> {
        let mut projects = self.store.project_search_by_name(term)?;
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    pub fn without_tasks(&self) -> ServiceResult<Vec<Project>> {
        Ok(self.store.projects_without_tasks()?)
    }

    pub fn overdue(&self) -> ServiceResult<Vec<Project>> {
        Ok(self.store.projects_overdue(Utc::now())?)
    }

    pub fn with_deadline_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> ServiceResult<Vec<Project>> {
        Ok(self.store.projects_with_deadline_between(start, end)?)
    }

    pub fn created_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> ServiceResult<Vec<Project>> {
        Ok(self.store.projects_created_between(start, end)?)
    }

    pub(crate) fn require(&self, id: EntityId) -> ServiceResult<Project> {
        self.store
            .project_get(id)?
            .ok_or_else(|| ServiceError::not_found(format!("Project not found with id {id}")))
    }
}
