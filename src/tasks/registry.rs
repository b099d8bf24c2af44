//! Shared Task Registry
//!
//! Tracks which tasks exist fleet-wide (the `task_ids` set in the shared store) and answers
//! status queries by asking the execution engine. Membership and status are merged at read
//! time; the registry never caches engine state.

use super::types::TaskRecord;
use crate::error::{CoordError, Result};
use crate::executor::engine::ExecutionEngine;
use crate::executor::types::{Job, TaskId, TaskState};
use crate::storage::SharedStore;
use crate::storage::store::TASK_IDS_KEY;

use std::sync::Arc;
use std::time::Duration;

const INDEX_ATTEMPTS: usize = 3;
const INDEX_INITIAL_DELAY_MS: u64 = 150;
const INDEX_MAX_DELAY_MS: u64 = 1200;

/// A write against the `task_ids` set.
#[derive(Debug, Clone, Copy)]
enum IndexOp {
    Add,
    Remove,
}

#[derive(Clone)]
pub struct TaskRegistry {
    store: Arc<dyn SharedStore>,
    engine: Arc<dyn ExecutionEngine>,
}

impl TaskRegistry {
    pub fn new(store: Arc<dyn SharedStore>, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self { store, engine }
    }

    /// Hands `job` to the engine and records its id in the fleet-wide task set.
    ///
    /// If the id cannot be added to the set after retrying, the task is revoked in the
    /// engine so it does not run unlisted, and `StoreUnavailable` is returned.
    pub async fn submit(&self, job: Job) -> Result<TaskId> {
        let handler = job.handler.clone();
        let task_id = self.engine.submit_job(job).await?;

        if let Err(e) = self.update_index(&task_id, IndexOp::Add).await {
            tracing::error!(
                "Task {} accepted by engine but not indexed: {}. Revoking",
                task_id,
                e
            );

            if let Err(revoke_err) = self.engine.revoke(&task_id).await {
                tracing::error!(
                    "Orphaned task {}: compensation revoke failed: {}",
                    task_id,
                    revoke_err
                );
            }

            return Err(e);
        }

        tracing::info!("Submitted task {} (job: {})", task_id, handler);

        Ok(task_id)
    }

    async fn update_index(&self, task_id: &TaskId, op: IndexOp) -> Result<()> {
        let mut delay_ms = INDEX_INITIAL_DELAY_MS;

        for attempt in 1..=INDEX_ATTEMPTS {
            let outcome = match op {
                IndexOp::Add => self.store.set_add(TASK_IDS_KEY, task_id.as_str()).await,
                IndexOp::Remove => self.store.set_remove(TASK_IDS_KEY, task_id.as_str()).await,
            };

            match outcome {
                Ok(()) => return Ok(()),
                Err(e) if attempt == INDEX_ATTEMPTS => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Index {:?} for task {} failed (attempt {}/{}): {}",
                        op,
                        task_id,
                        attempt,
                        INDEX_ATTEMPTS,
                        e
                    );
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(INDEX_MAX_DELAY_MS);
                }
            }
        }

        Err(CoordError::StoreUnavailable(
            "task index retry attempts exhausted".to_string(),
        ))
    }

    /// Current record for `task_id`. Set membership is not required.
    pub async fn get_status(&self, task_id: &TaskId) -> Result<TaskRecord> {
        let status = self
            .engine
            .get_status(task_id)
            .await?
            .ok_or_else(|| CoordError::TaskNotFound(task_id.to_string()))?;

        Ok(TaskRecord::from_status(task_id.clone(), status))
    }

    /// Revokes a PENDING task and drops it from the task set.
    ///
    /// A task that is already REVOKED only has its set removal finished, so a cancel that
    /// failed after the revoke can be retried. RUNNING, SUCCESS and FAILED are left untouched
    /// and reported as `InvalidState`.
    pub async fn cancel(&self, task_id: &TaskId) -> Result<()> {
        let status = self
            .engine
            .get_status(task_id)
            .await?
            .ok_or_else(|| CoordError::TaskNotFound(task_id.to_string()))?;

        match status.state {
            // A worker may claim the task between the check and the revoke; the engine then
            // answers InvalidState itself.
            TaskState::Pending => self.engine.revoke(task_id).await?,
            TaskState::Revoked => {
                tracing::debug!("Task {} already revoked, finishing removal", task_id);
            }
            state => {
                return Err(CoordError::InvalidState {
                    task_id: task_id.to_string(),
                    status: state.to_string(),
                });
            }
        }

        self.update_index(task_id, IndexOp::Remove).await?;

        tracing::info!("Cancelled task {}", task_id);

        Ok(())
    }

    /// Every indexed task the engine can still describe, in no particular order.
    pub async fn list(&self) -> Result<Vec<TaskRecord>> {
        let ids = self.store.set_members(TASK_IDS_KEY).await?;
        let mut records = Vec::with_capacity(ids.len());

        for id in ids {
            let task_id = TaskId::from(id);

            match self.engine.get_status(&task_id).await {
                Ok(Some(status)) => records.push(TaskRecord::from_status(task_id, status)),
                Ok(None) => {
                    tracing::debug!("Indexed task {} has no engine record, skipping", task_id);
                }
                Err(e @ CoordError::StoreUnavailable(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("Skipping task {}: {}", task_id, e);
                }
            }
        }

        Ok(records)
    }
}
