//! Execution engine boundary.
//!
//! The coordination layer does not run jobs; it only tracks them. Whatever actually runs
//! ingestion/query work sits behind [`ExecutionEngine`], owns the authoritative task status,
//! and must hand back typed [`EngineStatus`] values.

use super::types::{EngineStatus, Job, TaskId};
use crate::error::Result;

use async_trait::async_trait;

#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Accepts a job, assigns its id and starts tracking it as PENDING.
    async fn submit_job(&self, job: Job) -> Result<TaskId>;

    /// Current status of `task_id`, or `None` if the engine has no record of it.
    ///
    /// Fails with `EngineLookup` when the engine cannot answer and `RecordCorrupt` when its
    /// record cannot be decoded.
    async fn get_status(&self, task_id: &TaskId) -> Result<Option<EngineStatus>>;

    /// Forces a not-yet-started task into REVOKED.
    async fn revoke(&self, task_id: &TaskId) -> Result<()>;
}
