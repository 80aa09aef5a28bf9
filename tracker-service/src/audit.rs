//! Audit recorder and audit query surface.
//!
//! The recorder is the only writer into the audit store, and its write
//! path never raises: a failed append is logged and discarded so audit
//! completeness can never compromise primary-store correctness or block
//! the calling operation. That is the one place in this crate where an
//! error is deliberately swallowed.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, error, info};
use tracker_core::{
    resolve_actor, AuditAction, AuditEntry, EntityId, EntityType, Page, PageRequest, Timestamp,
    ANONYMOUS_ACTOR,
};
use tracker_storage::{AuditQuery, AuditStore};

use crate::error::{ServiceError, ServiceResult};
use crate::types::CleanupReport;
use tracker_core::SortOrder;

/// Stores return entries newest-first; ascending requests flip them.
fn paginate(mut entries: Vec<AuditEntry>, page: &PageRequest) -> Page<AuditEntry> {
    if page.sort == SortOrder::Ascending {
        entries.reverse();
    }
    Page::from_items(entries, page)
}

/// Default retention window for cleanup, in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Default trailing window for criteria search with no dates supplied.
const DEFAULT_SEARCH_WINDOW_DAYS: i64 = 30;

/// Criteria search filter. Unset fields match everything; unset dates get
/// the trailing-window defaults.
#[derive(Debug, Clone, Default)]
pub struct AuditSearchCriteria {
    pub entity_type: Option<EntityType>,
    pub action: Option<AuditAction>,
    pub actor: Option<String>,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

/// Append-side and query-side gateway to the audit store.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Append one audit entry. Never fails: on store failure the entry is
    /// logged and discarded.
    pub fn record(
        &self,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: Option<EntityId>,
        actor: &str,
        payload: serde_json::Value,
    ) {
        let entry = AuditEntry::new(action, entity_type, entity_id, actor, payload);
        match self.store.append(&entry) {
            Ok(()) => {
                debug!(
                    action = %action,
                    entity_type = %entity_type,
                    entity_id = ?entity_id,
                    actor,
                    "audit entry recorded"
                );
            }
            Err(err) => {
                error!(
                    action = %action,
                    entity_type = %entity_type,
                    entity_id = ?entity_id,
                    actor,
                    error = %err,
                    "failed to record audit entry, discarding"
                );
            }
        }
    }

    /// Record a failed authentication attempt. The rejected caller has no
    /// entity, so the entry carries a null entity id and the anonymous
    /// actor unless the upstream provider resolved a name.
    pub fn record_auth_failure(&self, username_or_email: &str, reason: &str, actor: Option<&str>) {
        let actor = match actor {
            Some(a) if !a.trim().is_empty() => a.trim().to_string(),
            _ => ANONYMOUS_ACTOR.to_string(),
        };
        self.record(
            AuditAction::Update,
            EntityType::Developer,
            None,
            &actor,
            json!({
                "action": "LOGIN_FAILED",
                "usernameOrEmail": username_or_email,
                "reason": reason,
            }),
        );
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get one entry by ID.
    pub fn entry(&self, id: EntityId) -> ServiceResult<AuditEntry> {
        self.store
            .get(id)?
            .ok_or_else(|| ServiceError::not_found(format!("Audit entry not found with id {id}")))
    }

    /// All entries, newest first, paginated.
    pub fn list(&self, page: PageRequest) -> ServiceResult<Page<AuditEntry>> {
        let entries = self.store.find(&AuditQuery::default())?;
        Ok(paginate(entries, &page))
    }

    /// Entries for one entity type, paginated.
    pub fn list_by_entity_type(
        &self,
        entity_type: EntityType,
        page: PageRequest,
    ) -> ServiceResult<Page<AuditEntry>> {
        let entries = self.store.find(&AuditQuery {
            entity_type: Some(entity_type),
            ..Default::default()
        })?;
        Ok(paginate(entries, &page))
    }

    /// Entries for one action type, paginated.
    pub fn list_by_action(
        &self,
        action: AuditAction,
        page: PageRequest,
    ) -> ServiceResult<Page<AuditEntry>> {
        let entries = self.store.find(&AuditQuery {
            action: Some(action),
            ..Default::default()
        })?;
        Ok(paginate(entries, &page))
    }

    /// Entries by one actor, paginated.
    pub fn list_by_actor(&self, actor: &str, page: PageRequest) -> ServiceResult<Page<AuditEntry>> {
        let entries = self.store.find(&AuditQuery {
            actor: Some(actor.to_string()),
            ..Default::default()
        })?;
        Ok(paginate(entries, &page))
    }

    /// Full history of one entity, newest first.
    pub fn entries_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> ServiceResult<Vec<AuditEntry>> {
        Ok(self.store.find(&AuditQuery {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
            ..Default::default()
        })?)
    }

    /// Entries within an explicit time range, newest first.
    pub fn entries_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> ServiceResult<Vec<AuditEntry>> {
        Ok(self.store.find(&AuditQuery {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        })?)
    }

    /// Entries from the last `days` days, newest first.
    pub fn recent(&self, days: i64) -> ServiceResult<Vec<AuditEntry>> {
        let cutoff = Utc::now() - Duration::days(days);
        Ok(self.store.find(&AuditQuery {
            start: Some(cutoff),
            ..Default::default()
        })?)
    }

    /// Combined criteria search. An unset end date means now; an unset
    /// start date means 30 days before now.
    pub fn search(
        &self,
        criteria: &AuditSearchCriteria,
        page: PageRequest,
    ) -> ServiceResult<Page<AuditEntry>> {
        let end = criteria.end.unwrap_or_else(Utc::now);
        let start = criteria
            .start
            .unwrap_or_else(|| Utc::now() - Duration::days(DEFAULT_SEARCH_WINDOW_DAYS));

        let entries = self.store.find(&AuditQuery {
            entity_type: criteria.entity_type,
            entity_id: None,
            action: criteria.action,
            actor: criteria.actor.clone(),
            start: Some(start),
            end: Some(end),
        })?;
        Ok(paginate(entries, &page))
    }

    // ========================================================================
    // Retention
    // ========================================================================

    /// Delete entries older than the retention window. Entries exactly at
    /// the cutoff survive.
    pub fn cleanup(
        &self,
        retention_days: Option<u32>,
        actor: Option<&str>,
    ) -> ServiceResult<CleanupReport> {
        let retention_days = retention_days.unwrap_or(DEFAULT_RETENTION_DAYS);
        let actor = resolve_actor(actor);
        let cutoff = Utc::now() - Duration::days(i64::from(retention_days));

        info!(retention_days, actor, "cleaning up audit entries");
        let deleted_count = self.store.delete_before(cutoff)?;
        info!(deleted_count, "audit cleanup finished");

        Ok(CleanupReport {
            deleted_count,
            retention_days,
            actor,
            timestamp: Utc::now(),
        })
    }

    /// Total number of stored entries.
    pub fn total(&self) -> ServiceResult<u64> {
        Ok(self.store.len()?)
    }

    /// Count of entries matching a bare filter.
    pub fn count(&self, query: &AuditQuery) -> ServiceResult<u64> {
        Ok(self.store.count(query)?)
    }
}
