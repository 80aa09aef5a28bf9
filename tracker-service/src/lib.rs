//! Tracker Service Layer
//!
//! Business operations over the primary store, with three cross-cutting
//! guarantees enforced here and nowhere else:
//!
//! - every successful mutation records a best-effort audit entry in a
//!   store independent of the primary write, and a failed audit append
//!   never fails or blocks the business operation;
//! - cache eviction runs on the writer's call path, before the result is
//!   returned, so no reader observes a cache entry older than the latest
//!   committed write;
//! - bulk operations report well-defined partial-success semantics.

pub mod audit;
pub mod bulk;
pub mod developer;
pub mod error;
pub mod project;
pub mod stats;
pub mod task;
pub mod types;

pub use audit::{AuditRecorder, AuditSearchCriteria, DEFAULT_RETENTION_DAYS};
pub use bulk::BatchOutcome;
pub use developer::DeveloperService;
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use project::ProjectService;
pub use stats::{DeveloperTaskLoad, StatisticsAggregator};
pub use task::TaskService;
pub use types::{
    BulkTaskUpdate, CleanupReport, CreateDeveloperRequest, CreateProjectRequest,
    CreateTaskRequest, DeveloperDetail, ProjectDetail, TaskSummary, UpdateDeveloperRequest,
    UpdateProjectRequest, UpdateTaskRequest,
};

use std::sync::Arc;

use tracker_storage::{
    AuditStore, EntityCache, InMemoryAuditStore, InMemoryCacheBackend, InMemoryPrimaryStore,
    PrimaryStore,
};

/// All services wired over one shared store, cache, and audit recorder.
#[derive(Clone)]
pub struct Tracker {
    pub projects: ProjectService,
    pub developers: DeveloperService,
    pub tasks: TaskService,
    pub audit: AuditRecorder,
    pub stats: StatisticsAggregator,
}

impl Tracker {
    pub fn new(
        store: Arc<dyn PrimaryStore>,
        cache: EntityCache,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        let audit = AuditRecorder::new(audit_store.clone());
        Self {
            projects: ProjectService::new(store.clone(), cache.clone(), audit.clone()),
            developers: DeveloperService::new(store.clone(), cache.clone(), audit.clone()),
            tasks: TaskService::new(store.clone(), cache, audit.clone()),
            stats: StatisticsAggregator::new(store, audit_store),
            audit,
        }
    }

    /// Everything in memory. The standard wiring for tests and demos.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryPrimaryStore::new()),
            EntityCache::new(Arc::new(InMemoryCacheBackend::new())),
            Arc::new(InMemoryAuditStore::new()),
        )
    }
}
