//! Query-time statistics over the primary and audit stores.
//!
//! Nothing is maintained incrementally: every figure is computed on
//! demand from current committed state plus whatever the audit store
//! holds at that instant. Under concurrent writers the results are
//! snapshots, not linearizable totals.
//!
//! Maps are `BTreeMap` so label ordering is stable across calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracker_core::{
    AuditAction, Developer, EntityId, EntityType, ProjectStatus, TaskStatus,
};
use tracker_storage::{AuditQuery, AuditStore, PrimaryStore};

use crate::error::{ServiceError, ServiceResult};

/// One row in the developer task-load ranking.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeveloperTaskLoad {
    pub developer_id: EntityId,
    pub name: String,
    pub task_count: u64,
}

#[derive(Clone)]
pub struct StatisticsAggregator {
    store: Arc<dyn PrimaryStore>,
    audit_store: Arc<dyn AuditStore>,
}

impl StatisticsAggregator {
    pub fn new(store: Arc<dyn PrimaryStore>, audit_store: Arc<dyn AuditStore>) -> Self {
        Self { store, audit_store }
    }

    // ========================================================================
    // Task Statistics
    // ========================================================================

    /// Overall task-status distribution, plus TOTAL, UNASSIGNED, OVERDUE.
    pub fn task_status_distribution(&self) -> ServiceResult<BTreeMap<String, u64>> {
        let tasks = self.store.task_list()?;
        let now = Utc::now();

        let mut stats = BTreeMap::new();
        for status in TaskStatus::all() {
            let count = tasks.iter().filter(|t| t.status == status).count() as u64;
            stats.insert(status.as_db_str().to_string(), count);
        }
        stats.insert("TOTAL".to_string(), tasks.len() as u64);
        stats.insert(
            "UNASSIGNED".to_string(),
            tasks.iter().filter(|t| t.assigned_developer_id.is_none()).count() as u64,
        );
        stats.insert(
            "OVERDUE".to_string(),
            tasks.iter().filter(|t| t.is_overdue(now)).count() as u64,
        );
        Ok(stats)
    }

    /// Task-status distribution within one project.
    pub fn task_status_by_project(
        &self,
        project_id: EntityId,
    ) -> ServiceResult<BTreeMap<String, u64>> {
        if self.store.project_get(project_id)?.is_none() {
            return Err(ServiceError::not_found(format!(
                "Project not found with id {project_id}"
            )));
        }
        let tasks = self.store.task_list_by_project(project_id)?;
        let mut stats = BTreeMap::new();
        for status in TaskStatus::all() {
            let count = tasks.iter().filter(|t| t.status == status).count() as u64;
            stats.insert(status.as_db_str().to_string(), count);
        }
        stats.insert("TOTAL".to_string(), tasks.len() as u64);
        Ok(stats)
    }

    /// Task-status distribution of one developer's assignments.
    pub fn task_status_by_developer(
        &self,
        developer_id: EntityId,
    ) -> ServiceResult<BTreeMap<String, u64>> {
        if self.store.developer_get(developer_id)?.is_none() {
            return Err(ServiceError::not_found(format!(
                "Developer not found with id {developer_id}"
            )));
        }
        let tasks = self.store.task_list_by_developer(developer_id)?;
        let mut stats = BTreeMap::new();
        for status in TaskStatus::all() {
            let count = tasks.iter().filter(|t| t.status == status).count() as u64;
            stats.insert(status.as_db_str().to_string(), count);
        }
        stats.insert("TOTAL".to_string(), tasks.len() as u64);
        Ok(stats)
    }

    // ========================================================================
    // Project and Developer Statistics
    // ========================================================================

    /// Project-status distribution plus TOTAL and OVERDUE.
    pub fn project_status_distribution(&self) -> ServiceResult<BTreeMap<String, u64>> {
        let projects = self.store.project_list()?;
        let now = Utc::now();

        let mut stats = BTreeMap::new();
        for status in ProjectStatus::all() {
            let count = projects.iter().filter(|p| p.status == status).count() as u64;
            stats.insert(status.as_db_str().to_string(), count);
        }
        stats.insert("TOTAL".to_string(), projects.len() as u64);
        stats.insert(
            "OVERDUE".to_string(),
            projects.iter().filter(|p| p.is_overdue(now)).count() as u64,
        );
        Ok(stats)
    }

    /// Developers ranked by assigned task count, descending. Ties break by
    /// name so the ranking is deterministic. `limit` caps the result when
    /// set.
    pub fn developer_task_load(
        &self,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<DeveloperTaskLoad>> {
        let developers = self.store.developer_list()?;
        let tasks = self.store.task_list()?;

        let mut loads: Vec<DeveloperTaskLoad> = developers
            .iter()
            .map(|d: &Developer| DeveloperTaskLoad {
                developer_id: d.developer_id,
                name: d.name.clone(),
                task_count: tasks
                    .iter()
                    .filter(|t| t.assigned_developer_id == Some(d.developer_id))
                    .count() as u64,
            })
            .collect();
        loads.sort_by(|a, b| {
            b.task_count
                .cmp(&a.task_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        if let Some(cap) = limit {
            loads.truncate(cap);
        }
        Ok(loads)
    }

    /// Skill usage counts. Skills are normalized at write time, so this
    /// aggregation is case-insensitive by construction.
    pub fn skill_counts(&self) -> ServiceResult<BTreeMap<String, u64>> {
        let developers = self.store.developer_list()?;
        let mut counts = BTreeMap::new();
        for developer in &developers {
            for skill in &developer.skills {
                *counts.entry(skill.clone()).or_insert(0u64) += 1;
            }
        }
        Ok(counts)
    }

    // ========================================================================
    // Audit Statistics
    // ========================================================================

    /// Total entries plus trailing 7- and 30-day counts.
    pub fn audit_totals(&self) -> ServiceResult<BTreeMap<String, u64>> {
        let now = Utc::now();
        let mut stats = BTreeMap::new();
        stats.insert("totalLogs".to_string(), self.audit_store.len()?);
        stats.insert(
            "recentLogs7Days".to_string(),
            self.audit_store.count(&AuditQuery {
                start: Some(now - Duration::days(7)),
                ..Default::default()
            })?,
        );
        stats.insert(
            "recentLogs30Days".to_string(),
            self.audit_store.count(&AuditQuery {
                start: Some(now - Duration::days(30)),
                ..Default::default()
            })?,
        );
        Ok(stats)
    }

    /// Entry counts per entity type.
    pub fn audit_by_entity_type(&self) -> ServiceResult<BTreeMap<String, u64>> {
        let mut stats = BTreeMap::new();
        for entity_type in EntityType::all() {
            let count = self.audit_store.count(&AuditQuery {
                entity_type: Some(entity_type),
                ..Default::default()
            })?;
            stats.insert(entity_type.as_db_str().to_string(), count);
        }
        Ok(stats)
    }

    /// Entry counts per action type.
    pub fn audit_by_action(&self) -> ServiceResult<BTreeMap<String, u64>> {
        let mut stats = BTreeMap::new();
        for action in AuditAction::all() {
            let count = self.audit_store.count(&AuditQuery {
                action: Some(action),
                ..Default::default()
            })?;
            stats.insert(action.as_db_str().to_string(), count);
        }
        Ok(stats)
    }

    /// Entry counts per actor, over the whole store.
    pub fn audit_by_actor(&self) -> ServiceResult<BTreeMap<String, u64>> {
        let entries = self.audit_store.find(&AuditQuery::default())?;
        let mut counts = BTreeMap::new();
        for entry in &entries {
            *counts.entry(entry.actor.clone()).or_insert(0u64) += 1;
        }
        Ok(counts)
    }
}
