//! Error taxonomy for the coordination layer.
//!
//! Every fallible operation in the library returns [`CoordError`]. Batch operations
//! (fleet listing, task listing, streaming ticks) swallow the per-record variants and
//! only surface the ones that make the whole call meaningless.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordError {
    /// The shared store could not be reached or rejected the command.
    #[error("Shared store unavailable: {0}")]
    StoreUnavailable(String),

    /// A single stored record failed to decode.
    #[error("Corrupt record at {key}: {reason}")]
    RecordCorrupt { key: String, reason: String },

    /// The execution engine could not answer a status query.
    #[error("Execution engine lookup failed for task {task_id}: {reason}")]
    EngineLookup { task_id: String, reason: String },

    /// Cancellation requested for a task that already left PENDING.
    #[error("Task {task_id} cannot be cancelled in state {status}")]
    InvalidState { task_id: String, status: String },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Local metric sampling failed for one heartbeat tick.
    #[error("Metric sampling failed: {0}")]
    Sampling(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, CoordError>;

impl CoordError {
    /// Stable snake_case identifier used in HTTP bodies and stream notifications.
    pub fn kind(&self) -> &'static str {
        match self {
            CoordError::StoreUnavailable(_) => "store_unavailable",
            CoordError::RecordCorrupt { .. } => "record_corrupt",
            CoordError::EngineLookup { .. } => "engine_lookup_failure",
            CoordError::InvalidState { .. } => "invalid_state",
            CoordError::TaskNotFound(_) => "task_not_found",
            CoordError::Sampling(_) => "sampling_failure",
            CoordError::BadRequest(_) => "bad_request",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CoordError::InvalidState { .. } | CoordError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            CoordError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            CoordError::StoreUnavailable(_)
            | CoordError::RecordCorrupt { .. }
            | CoordError::EngineLookup { .. }
            | CoordError::Sampling(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub kind: &'static str,
}

impl IntoResponse for CoordError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        } else {
            tracing::warn!(kind = self.kind(), "{}", self);
        }

        let body = ErrorResponse {
            detail: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}
