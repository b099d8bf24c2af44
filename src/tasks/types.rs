use crate::executor::types::{EngineStatus, TaskId, TaskState};
use serde::{Deserialize, Serialize};

/// Placeholder owner reported until a worker claims the task.
pub const UNKNOWN_OWNER: &str = "unknown";

/// Client-facing view of one task: registry membership merged with the engine's status.
///
/// Only built through [`TaskRecord::from_status`], so `result` is set iff the status is
/// SUCCESS and `error` iff it is FAILED.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub status: String,
    pub owning_node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn from_status(task_id: TaskId, status: EngineStatus) -> Self {
        let owning_node = status
            .owning_node
            .map(|node| node.0)
            .unwrap_or_else(|| UNKNOWN_OWNER.to_string());
        let label = status.state.label().to_string();

        let (result, error) = match status.state {
            TaskState::Success { result } => (Some(result), None),
            TaskState::Failed { error } => (None, Some(error)),
            TaskState::Pending | TaskState::Running | TaskState::Revoked => (None, None),
        };

        Self {
            task_id,
            status: label,
            owning_node,
            result,
            error,
        }
    }
}
