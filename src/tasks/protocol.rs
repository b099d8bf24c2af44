//! HTTP contracts for task tracking and job submission.

use super::types::TaskRecord;
use crate::executor::types::TaskId;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_TASKS: &str = "/tasks";
pub const ENDPOINT_TASK: &str = "/tasks/:id";
pub const ENDPOINT_WS_TASKS: &str = "/ws/tasks";
pub const ENDPOINT_UPLOAD: &str = "/upload";
pub const ENDPOINT_QUERY: &str = "/query";

#[derive(Debug, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: TaskId,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub message: String,
}
