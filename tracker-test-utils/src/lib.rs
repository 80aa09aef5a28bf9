//! Shared fixtures and failure-injection doubles for tracker tests.
//!
//! Everything here is test-only. The one non-trivial piece is
//! [`FailingAuditStore`], which proves the audit decoupling contract: a
//! primary mutation must succeed even when every audit append fails.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Utc};
use tracker_core::{
    AuditEntry, Developer, EntityId, Project, StorageError, Task, Timestamp, TrackerResult,
};
use tracker_storage::{AuditQuery, AuditStore};

/// A project due 30 days out, in the default status.
pub fn sample_project(name: &str) -> Project {
    Project::new(
        name,
        Some("fixture project"),
        Utc::now() + Duration::days(30),
    )
}

/// A developer with one skill and a derived unique-ish email.
pub fn sample_developer(name: &str) -> Developer {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    Developer::new(name, &email, vec!["rust".to_string()])
}

/// An unassigned task in the default status.
pub fn sample_task(title: &str, project_id: EntityId) -> Task {
    Task::new(title, Some("fixture task"), project_id)
}

/// Audit store double whose every append fails.
///
/// Reads behave as an empty store. Counts attempted appends so tests can
/// assert the write path actually tried to record.
#[derive(Debug, Default)]
pub struct FailingAuditStore {
    attempted_appends: AtomicU64,
}

impl FailingAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of appends that were attempted (and refused).
    pub fn attempted_appends(&self) -> u64 {
        self.attempted_appends.load(Ordering::Relaxed)
    }
}

impl AuditStore for FailingAuditStore {
    fn append(&self, _entry: &AuditEntry) -> TrackerResult<()> {
        self.attempted_appends.fetch_add(1, Ordering::Relaxed);
        Err(StorageError::AppendFailed {
            reason: "injected failure".to_string(),
        }
        .into())
    }

    fn get(&self, _id: EntityId) -> TrackerResult<Option<AuditEntry>> {
        Ok(None)
    }

    fn find(&self, _query: &AuditQuery) -> TrackerResult<Vec<AuditEntry>> {
        Ok(Vec::new())
    }

    fn count(&self, _query: &AuditQuery) -> TrackerResult<u64> {
        Ok(0)
    }

    fn delete_before(&self, _cutoff: Timestamp) -> TrackerResult<u64> {
        Ok(0)
    }

    fn len(&self) -> TrackerResult<u64> {
        Ok(0)
    }
}
