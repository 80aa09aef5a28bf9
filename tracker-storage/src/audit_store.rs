//! Append-only audit store, independent of the primary store.
//!
//! Entries are immutable once appended. The only deletion path is
//! `delete_before`, the retention cleanup statement.

use std::sync::RwLock;

use tracker_core::{
    AuditAction, AuditEntry, EntityId, EntityType, StorageError, Timestamp, TrackerResult,
};

/// All-`Option` filter for audit queries. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<EntityId>,
    pub action: Option<AuditAction>,
    pub actor: Option<String>,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl AuditQuery {
    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(et) = self.entity_type {
            if entry.entity_type != et {
                return false;
            }
        }
        if let Some(id) = self.entity_id {
            if entry.entity_id != Some(id) {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        if let Some(ref actor) = self.actor {
            if &entry.actor != actor {
                return false;
            }
        }
        if let Some(start) = self.start {
            if entry.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if entry.timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Append-only audit log storage.
pub trait AuditStore: Send + Sync {
    /// Append one entry. This is the only write path besides cleanup.
    fn append(&self, entry: &AuditEntry) -> TrackerResult<()>;

    /// Get one entry by ID.
    fn get(&self, id: EntityId) -> TrackerResult<Option<AuditEntry>>;

    /// Entries matching the filter, newest first.
    fn find(&self, query: &AuditQuery) -> TrackerResult<Vec<AuditEntry>>;

    /// Count of entries matching the filter.
    fn count(&self, query: &AuditQuery) -> TrackerResult<u64>;

    /// Delete every entry with `timestamp` strictly before `cutoff`.
    /// Returns the number deleted.
    fn delete_before(&self, cutoff: Timestamp) -> TrackerResult<u64>;

    /// Total number of stored entries.
    fn len(&self) -> TrackerResult<u64>;

    fn is_empty(&self) -> TrackerResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// In-memory audit store backed by a single vec under a lock.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStore for InMemoryAuditStore {
    fn append(&self, entry: &AuditEntry) -> TrackerResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        entries.push(entry.clone());
        Ok(())
    }

    fn get(&self, id: EntityId) -> TrackerResult<Option<AuditEntry>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.iter().find(|e| e.entry_id == id).cloned())
    }

    fn find(&self, query: &AuditQuery) -> TrackerResult<Vec<AuditEntry>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut matched: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matched)
    }

    fn count(&self, query: &AuditQuery) -> TrackerResult<u64> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.iter().filter(|e| query.matches(e)).count() as u64)
    }

    fn delete_before(&self, cutoff: Timestamp) -> TrackerResult<u64> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let before = entries.len();
        entries.retain(|e| e.timestamp >= cutoff);
        Ok((before - entries.len()) as u64)
    }

    fn len(&self) -> TrackerResult<u64> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.len() as u64)
    }
}
