//! Reference Execution Engine
//!
//! `LocalEngine` is the in-process engine a node uses when no external one is wired in.
//!
//! ## Responsibilities
//! - **Status records**: every task's typed status lives in the shared store at
//!   `task_meta:{task_id}`, so any node in the fleet can answer `get_status`.
//! - **Dispatch**: submitted ids go onto an in-process channel drained by a worker pool.
//! - **Execution**: workers claim a task by moving it PENDING → RUNNING with their node id,
//!   run the registered handler, then record SUCCESS(result) or FAILED(error).
//! - **Revocation**: only PENDING tasks can be revoked; a worker that dequeues a revoked id
//!   drops it.
//!
//! Claim, outcome and revoke writes are read-check-write sequences against the store, so
//! they run under one per-engine lock. That serializes them within this process only: a
//! revoke issued by another node's engine against the same record can still interleave
//! with a local claim.

use super::engine::ExecutionEngine;
use super::registry::JobHandlerRegistry;
use super::types::*;
use crate::error::{CoordError, Result};
use crate::membership::types::NodeId;
use crate::storage::SharedStore;
use crate::storage::store::task_meta_key;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct LocalEngine {
    node_id: NodeId,
    store: Arc<dyn SharedStore>,
    handlers: Arc<JobHandlerRegistry>,
    queue_tx: mpsc::UnboundedSender<TaskId>,
    queue_rx: Mutex<mpsc::UnboundedReceiver<TaskId>>,
    /// Held across every read-check-write of a status record.
    transition_lock: Mutex<()>,
    worker_count: usize,
}

impl LocalEngine {
    pub fn new(
        node_id: NodeId,
        store: Arc<dyn SharedStore>,
        handlers: Arc<JobHandlerRegistry>,
        worker_count: usize,
    ) -> Arc<Self> {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();

        Arc::new(Self {
            node_id,
            store,
            handlers,
            queue_tx,
            queue_rx: Mutex::new(queue_rx),
            transition_lock: Mutex::new(()),
            worker_count,
        })
    }

    /// Spawns the worker pool and returns its handles. Workers stop when `shutdown` fires.
    pub fn start(self: &Arc<Self>, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        tracing::info!("Starting {} job workers", self.worker_count);

        (0..self.worker_count)
            .map(|worker_id| {
                let engine = self.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    engine.worker_loop(worker_id, shutdown).await;
                })
            })
            .collect()
    }

    async fn worker_loop(&self, worker_id: usize, shutdown: CancellationToken) {
        tracing::debug!("Worker {} started", worker_id);

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = async { self.queue_rx.lock().await.recv().await } => next,
            };

            let Some(task_id) = next else {
                break;
            };

            self.run_task(worker_id, &task_id).await;
        }

        tracing::debug!("Worker {} stopped", worker_id);
    }

    /// Claim → execute → record outcome for one dequeued task.
    async fn run_task(&self, worker_id: usize, task_id: &TaskId) {
        let Some(job) = self.claim(worker_id, task_id).await else {
            return;
        };

        tracing::info!(
            "Worker {} claimed task {} (handler: {})",
            worker_id,
            task_id,
            job.handler
        );

        let state = match self.execute_job(&job).await {
            Ok(result) => {
                tracing::info!("Task {} completed", task_id);
                TaskState::Success { result }
            }
            Err(error) => {
                tracing::error!("Task {} failed: {}", task_id, error);
                TaskState::Failed { error }
            }
        };

        self.record_outcome(task_id, state).await;
    }

    /// Moves a PENDING task to RUNNING on this node. `None` means the worker must drop it.
    async fn claim(&self, worker_id: usize, task_id: &TaskId) -> Option<Job> {
        let _guard = self.transition_lock.lock().await;

        let mut entry = match self.load_entry(task_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::warn!("Dequeued task {} has no status record", task_id);
                return None;
            }
            Err(e) => {
                tracing::error!("Failed to load task {}: {}", task_id, e);
                return None;
            }
        };

        if entry.state != TaskState::Pending {
            tracing::info!(
                "Worker {} skipping task {} in state {}",
                worker_id,
                task_id,
                entry.state
            );
            return None;
        }

        entry.owning_node = Some(self.node_id.clone());
        entry.transition(TaskState::Running);
        if let Err(e) = self.save_entry(task_id, &entry).await {
            tracing::error!("Failed to mark task {} running: {}", task_id, e);
            return None;
        }

        Some(entry.job)
    }

    /// Writes the terminal state, unless the record no longer shows RUNNING.
    async fn record_outcome(&self, task_id: &TaskId, state: TaskState) {
        let _guard = self.transition_lock.lock().await;

        let mut entry = match self.load_entry(task_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::error!("Task {} lost its status record while running", task_id);
                return;
            }
            Err(e) => {
                tracing::error!("Failed to reload task {}: {}", task_id, e);
                return;
            }
        };

        if entry.state != TaskState::Running {
            tracing::warn!(
                "Not recording {} for task {}: record is already {}",
                state,
                task_id,
                entry.state
            );
            return;
        }

        entry.transition(state);
        if let Err(e) = self.save_entry(task_id, &entry).await {
            tracing::error!("Failed to record outcome of task {}: {}", task_id, e);
        }
    }

    /// Runs the handler on its own tokio task so a panic becomes a FAILED outcome.
    async fn execute_job(&self, job: &Job) -> std::result::Result<serde_json::Value, String> {
        let handlers = self.handlers.clone();
        let job = job.clone();

        match tokio::spawn(async move { handlers.execute(&job).await }).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_error) => Err(format!("handler panicked: {}", join_error)),
        }
    }

    async fn load_entry(&self, task_id: &TaskId) -> Result<Option<TaskEntry>> {
        let key = task_meta_key(task_id.as_str());
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CoordError::RecordCorrupt {
                key,
                reason: e.to_string(),
            })
    }

    async fn save_entry(&self, task_id: &TaskId, entry: &TaskEntry) -> Result<()> {
        let key = task_meta_key(task_id.as_str());
        let raw = serde_json::to_string(entry).map_err(|e| CoordError::RecordCorrupt {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.store.set(&key, &raw).await
    }
}

#[async_trait]
impl ExecutionEngine for LocalEngine {
    async fn submit_job(&self, job: Job) -> Result<TaskId> {
        if !self.handlers.has_handler(&job.handler) {
            return Err(CoordError::BadRequest(format!(
                "no handler registered for job kind '{}'",
                job.handler
            )));
        }

        let task_id = TaskId::new();
        self.save_entry(&task_id, &TaskEntry::pending(job)).await?;

        self.queue_tx
            .send(task_id.clone())
            .map_err(|_| CoordError::EngineLookup {
                task_id: task_id.to_string(),
                reason: "local worker queue is closed".to_string(),
            })?;

        tracing::debug!("Task {} queued on {}", task_id, self.node_id);

        Ok(task_id)
    }

    async fn get_status(&self, task_id: &TaskId) -> Result<Option<EngineStatus>> {
        match self.load_entry(task_id).await {
            Ok(entry) => Ok(entry.map(|entry| entry.status())),
            Err(CoordError::StoreUnavailable(reason)) => Err(CoordError::EngineLookup {
                task_id: task_id.to_string(),
                reason,
            }),
            Err(e) => Err(e),
        }
    }

    async fn revoke(&self, task_id: &TaskId) -> Result<()> {
        let _guard = self.transition_lock.lock().await;

        let mut entry = self
            .load_entry(task_id)
            .await?
            .ok_or_else(|| CoordError::TaskNotFound(task_id.to_string()))?;

        if entry.state != TaskState::Pending {
            return Err(CoordError::InvalidState {
                task_id: task_id.to_string(),
                status: entry.state.to_string(),
            });
        }

        entry.transition(TaskState::Revoked);
        self.save_entry(task_id, &entry).await?;

        tracing::info!("Task {} revoked", task_id);

        Ok(())
    }
}
