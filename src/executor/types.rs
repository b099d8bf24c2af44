use crate::membership::types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque task identifier assigned by the execution engine at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generates a new random UUID v4-based TaskId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of work handed to the execution engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Name of the registered handler to invoke (e.g. "ingest_csv").
    pub handler: String,
    /// Arbitrary JSON payload passed to the handler.
    pub payload: serde_json::Value,
}

impl Job {
    pub fn new(handler: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            handler: handler.into(),
            payload,
        }
    }
}

/// Lifecycle of a task as reported by the engine.
///
/// Decoded once at the engine boundary; nothing past it inspects untyped metadata. The
/// payload-carrying variants make "result only on success, error only on failure"
/// unrepresentable otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Submitted, not yet picked up by a worker.
    Pending,
    /// A worker on `owning_node` is executing it.
    Running,
    /// Finished; `result` is the handler's output.
    Success { result: serde_json::Value },
    /// The handler returned an error or panicked.
    Failed { error: String },
    /// Cancelled before it started.
    Revoked,
}

impl TaskState {
    pub fn label(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Running => "RUNNING",
            TaskState::Success { .. } => "SUCCESS",
            TaskState::Failed { .. } => "FAILED",
            TaskState::Revoked => "REVOKED",
        }
    }

    /// True once the task can no longer change state.
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            TaskState::Success { .. } | TaskState::Failed { .. } | TaskState::Revoked
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What `ExecutionEngine::get_status` answers with.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatus {
    pub state: TaskState,
    /// Node executing (or that executed) the task; `None` until a worker claims it.
    pub owning_node: Option<NodeId>,
}

/// The reference engine's persisted record, stored at `task_meta:{task_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEntry {
    pub job: Job,
    #[serde(flatten)]
    pub state: TaskState,
    pub owning_node: Option<NodeId>,
    /// Timestamp (ms) when the task was submitted.
    pub created_at: u64,
    /// Timestamp (ms) of the last state change.
    pub updated_at: u64,
}

impl TaskEntry {
    pub fn pending(job: Job) -> Self {
        let now = now_ms();
        Self {
            job,
            state: TaskState::Pending,
            owning_node: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition(&mut self, state: TaskState) {
        self.state = state;
        self.updated_at = now_ms();
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state.clone(),
            owning_node: self.owning_node.clone(),
        }
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
