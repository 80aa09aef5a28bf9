//! Developer service.
//!
//! Deleting a developer unassigns their tasks instead of deleting them,
//! and records exactly one DELETE entry for the developer. Skill values
//! are normalized (trim + lowercase) before they reach the store, so
//! aggregation over skills is case-insensitive by construction.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};
use tracker_core::{
    entities::{normalize_skill, normalize_skills},
    resolve_actor, AuditAction, Developer, EntityId, EntityType,
};
use tracker_storage::{CacheKey, DeveloperUpdate, EntityCache, PrimaryStore};

use crate::audit::AuditRecorder;
use crate::error::{ServiceError, ServiceResult};
use crate::project::snapshot;
use crate::types::{CreateDeveloperRequest, DeveloperDetail, UpdateDeveloperRequest};

#[derive(Clone)]
pub struct DeveloperService {
    store: Arc<dyn PrimaryStore>,
    cache: EntityCache,
    audit: AuditRecorder,
}

impl DeveloperService {
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
        request: CreateDeveloperRequest,
        actor: Option<&str>,
    ) -> ServiceResult<Developer> {
        request.validate()?;
        let actor = resolve_actor(actor);

        let developer = Developer::new(
            request.name.trim(),
            request.email.trim(),
            request.skills,
        );
        self.store.developer_insert(&developer)?;
        info!(developer_id = %developer.developer_id, email = %developer.email, "developer created");

        self.audit.record(
            AuditAction::Create,
            EntityType::Developer,
            Some(developer.developer_id),
            &actor,
            snapshot(&developer),
        );
        Ok(developer)
    }

    pub fn update(
        &self,
        id: EntityId,
        request: UpdateDeveloperRequest,
        actor: Option<&str>,
    ) -> ServiceResult<Developer> {
        request.validate()?;
        let actor = resolve_actor(actor);

        let old = self.require(id)?;
        let updated = self.store.developer_update(
            id,
            DeveloperUpdate {
                name: Some(request.name.trim().to_string()),
                email: Some(request.email.trim().to_string()),
                skills: Some(request.skills),
            },
        )?;

        self.cache
            .evict_many(&CacheKey::both(EntityType::Developer, id))?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Developer,
            Some(id),
            &actor,
            json!({
                "oldData": snapshot(&old),
                "newData": snapshot(&updated),
            }),
        );
        Ok(updated)
    }

    /// Delete a developer, unassigning their tasks. One DELETE entry; the
    /// unassigned tasks appear only in its payload.
    pub fn delete(&self, id: EntityId, actor: Option<&str>) -> ServiceResult<()> {
        let actor = resolve_actor(actor);
        let (developer, unassigned) = self.store.developer_delete(id)?;
        info!(
            developer_id = %id,
            unassigned_tasks = unassigned.len(),
            "developer deleted"
        );

        // Unassignment changes each task and each owning project's detail.
        let mut keys: Vec<CacheKey> = CacheKey::both(EntityType::Developer, id).to_vec();
        for task in &unassigned {
            keys.extend(CacheKey::both(EntityType::Task, task.task_id));
            keys.push(CacheKey::detail(EntityType::Project, task.project_id));
        }
        self.cache.evict_many(&keys)?;

        self.audit.record(
            AuditAction::Delete,
            EntityType::Developer,
            Some(id),
            &actor,
            json!({
                "developer": snapshot(&developer),
                "unassignedTaskCount": unassigned.len(),
            }),
        );
        Ok(())
    }

    // ========================================================================
    // Skill Operations
    // ========================================================================

    pub fn add_skill(
        &self,
        id: EntityId,
        skill: &str,
        actor: Option<&str>,
    ) -> ServiceResult<Developer> {
        let actor = resolve_actor(actor);
        let Some(normalized) = normalize_skill(skill) else {
            return Err(ServiceError::validation("skill must not be blank"));
        };

        let old = self.require(id)?;
        let mut skills: Vec<String> = old.skills.iter().cloned().collect();
        skills.push(normalized.clone());
        let updated = self.store.developer_update(
            id,
            DeveloperUpdate {
                skills: Some(skills),
                ..Default::default()
            },
        )?;

        self.cache
            .evict_many(&CacheKey::both(EntityType::Developer, id))?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Developer,
            Some(id),
            &actor,
            json!({
                "action": "ADD_SKILL",
                "skill": normalized,
                "developerId": id,
            }),
        );
        Ok(updated)
    }

    pub fn remove_skill(
        &self,
        id: EntityId,
        skill: &str,
        actor: Option<&str>,
    ) -> ServiceResult<Developer> {
        let actor = resolve_actor(actor);
        let Some(normalized) = normalize_skill(skill) else {
            return Err(ServiceError::validation("skill must not be blank"));
        };

        let old = self.require(id)?;
        let skills: Vec<String> = old
            .skills
            .iter()
            .filter(|s| *s != &normalized)
            .cloned()
            .collect();
        let updated = self.store.developer_update(
            id,
            DeveloperUpdate {
                skills: Some(skills),
                ..Default::default()
            },
        )?;

        self.cache
            .evict_many(&CacheKey::both(EntityType::Developer, id))?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Developer,
            Some(id),
            &actor,
            json!({
                "action": "REMOVE_SKILL",
                "skill": normalized,
                "developerId": id,
            }),
        );
        Ok(updated)
    }

    /// Replace the whole skill set.
    pub fn update_skills(
        &self,
        id: EntityId,
        skills: Vec<String>,
        actor: Option<&str>,
    ) -> ServiceResult<Developer> {
        let actor = resolve_actor(actor);

        let old = self.require(id)?;
        let updated = self.store.developer_update(
            id,
            DeveloperUpdate {
                skills: Some(skills),
                ..Default::default()
            },
        )?;

        self.cache
            .evict_many(&CacheKey::both(EntityType::Developer, id))?;

        self.audit.record(
            AuditAction::Update,
            EntityType::Developer,
            Some(id),
            &actor,
            json!({
                "action": "UPDATE_SKILLS",
                "oldSkills": snapshot(&old.skills),
                "newSkills": snapshot(&updated.skills),
                "developerId": id,
            }),
        );
        Ok(updated)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get(&self, id: EntityId) -> ServiceResult<Developer> {
        if let Some(cached) = self.cache.get::<Developer>(id)? {
            debug!(developer_id = %id, "developer served from cache");
            return Ok(cached);
        }
        let developer = self.require(id)?;
        self.cache.put(&developer)?;
        Ok(developer)
    }

    pub fn get_detail(&self, id: EntityId) -> ServiceResult<DeveloperDetail> {
        if let Some(cached) = self.cache.get::<DeveloperDetail>(id)? {
            debug!(developer_id = %id, "developer detail served from cache");
            return Ok(cached);
        }
        let developer = self.require(id)?;
        let tasks = self.store.task_list_by_developer(id)?;
        let detail = DeveloperDetail::build(developer, &tasks);
        self.cache.put(&detail)?;
        Ok(detail)
    }

    pub fn list(&self) -> ServiceResult<Vec<Developer>> {
        let mut developers = self.store.developer_list()?;
        developers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(developers)
    }

    pub fn search(&self, term: &str) -> ServiceResult<Vec<Developer>> {
        let mut developers = self.store.developer_search(term)?;
        developers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(developers)
    }

    pub fn by_skill(&self, skill: &str) -> ServiceResult<Vec<Developer>> {
        Ok(self.store.developers_by_skill(skill)?)
    }

    /// Developers holding at least one of the given skills. Input skills
    /// are normalized before matching, as they are at write time.
    pub fn by_skills(&self, skills: &[String]) -> ServiceResult<Vec<Developer>> {
        let normalized: Vec<String> = normalize_skills(skills.iter().cloned())
            .into_iter()
            .collect();
        Ok(self.store.developers_by_any_skill(&normalized)?)
    }

    pub fn without_tasks(&self) -> ServiceResult<Vec<Developer>> {
        Ok(self.store.developers_without_tasks()?)
    }

    /// Developers with capacity: fewer than `max_tasks` assigned tasks.
    pub fn available(&self, max_tasks: usize) -> ServiceResult<Vec<Developer>> {
        Ok(self.store.developers_available(max_tasks)?)
    }

    pub(crate) fn require(&self, id: EntityId) -> ServiceResult<Developer> {
        self.store
            .developer_get(id)?
            .ok_or_else(|| ServiceError::not_found(format!("Developer not found with id {id}")))
    }
}
