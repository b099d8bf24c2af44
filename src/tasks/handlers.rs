use super::protocol::*;
use super::registry::TaskRegistry;
use super::types::TaskRecord;
use crate::error::CoordError;
use crate::executor::jobs::{INGEST_CSV, QUERY, QUOTED_FIELDS_ERROR};
use crate::executor::types::{Job, TaskId};

use axum::http::{HeaderMap, header};
use axum::{Extension, Json, extract::Path};
use serde_json::json;

const SUBMITTED_MESSAGE: &str = "Task submitted to the queue";

pub async fn handle_list_tasks(
    Extension(registry): Extension<TaskRegistry>,
) -> Result<Json<TasksResponse>, CoordError> {
    let tasks = registry.list().await?;
    tracing::debug!("Listing {} tasks", tasks.len());
    Ok(Json(TasksResponse { tasks }))
}

pub async fn handle_get_task(
    Extension(registry): Extension<TaskRegistry>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskRecord>, CoordError> {
    let record = registry.get_status(&TaskId::from(task_id)).await?;
    tracing::debug!("Task status query: {} -> {}", record.task_id, record.status);
    Ok(Json(record))
}

pub async fn handle_cancel_task(
    Extension(registry): Extension<TaskRegistry>,
    Path(task_id): Path<String>,
) -> Result<Json<CancelResponse>, CoordError> {
    let task_id = TaskId::from(task_id);
    registry.cancel(&task_id).await?;
    Ok(Json(CancelResponse {
        message: format!("Task {} cancelled", task_id),
    }))
}

/// Accepts a raw CSV body and queues an `ingest_csv` job for it.
pub async fn handle_upload_csv(
    Extension(registry): Extension<TaskRegistry>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<SubmitResponse>, CoordError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    // Parameters such as "; charset=utf-8" are allowed.
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    if !mime.eq_ignore_ascii_case("text/csv") {
        return Err(CoordError::BadRequest(format!(
            "only CSV uploads are supported, got content type '{}'",
            content_type
        )));
    }

    if body.trim().is_empty() {
        return Err(CoordError::BadRequest("uploaded CSV is empty".to_string()));
    }
    if body.contains('"') {
        return Err(CoordError::BadRequest(QUOTED_FIELDS_ERROR.to_string()));
    }

    tracing::debug!("Received CSV upload ({} bytes)", body.len());

    let task_id = registry
        .submit(Job::new(INGEST_CSV, json!({ "csv": body })))
        .await?;

    Ok(Json(SubmitResponse {
        task_id,
        message: SUBMITTED_MESSAGE.to_string(),
    }))
}

pub async fn handle_upload_usage() -> Json<UsageResponse> {
    Json(UsageResponse {
        message: "Please use POST method to upload a CSV file".to_string(),
    })
}

pub async fn handle_submit_query(
    Extension(registry): Extension<TaskRegistry>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<SubmitResponse>, CoordError> {
    if req.query.trim().is_empty() {
        return Err(CoordError::BadRequest("query must not be empty".to_string()));
    }

    tracing::debug!("Received query: {}", req.query);

    let task_id = registry
        .submit(Job::new(QUERY, json!({ "query": req.query })))
        .await?;

    Ok(Json(SubmitResponse {
        task_id,
        message: SUBMITTED_MESSAGE.to_string(),
    }))
}

pub async fn handle_query_usage() -> Json<UsageResponse> {
    Json(UsageResponse {
        message: "Please use POST method to submit a query".to_string(),
    })
}
