//! Built-in job kinds a node registers at startup.
//!
//! Ingestion and querying proper belong to downstream services; these handlers parse and
//! validate their payloads and report what they would hand on.

use super::registry::JobHandlerRegistry;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};

pub const INGEST_CSV: &str = "ingest_csv";
pub const QUERY: &str = "query";

const CONTENT_COLUMN: &str = "content";

pub const QUOTED_FIELDS_ERROR: &str = "quoted CSV fields are not supported";

pub fn register_builtin_jobs(registry: &JobHandlerRegistry) {
    registry.register(INGEST_CSV, ingest_csv);
    registry.register(QUERY, run_query);
}

/// Counts rows with a non-empty `content` cell. Payload: `{"csv": "<text>"}`.
///
/// Fields are split on every comma, so RFC 4180 quoting is not understood. Input containing
/// a double quote is rejected instead of being miscounted.
pub async fn ingest_csv(payload: Value) -> Result<Value> {
    let text = payload
        .get("csv")
        .and_then(Value::as_str)
        .context("payload is missing the 'csv' field")?;

    if text.contains('"') {
        return Err(anyhow!(QUOTED_FIELDS_ERROR));
    }

    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header = lines.next().ok_or_else(|| anyhow!("CSV has no header row"))?;

    let content_idx = header
        .split(',')
        .position(|column| column.trim() == CONTENT_COLUMN)
        .ok_or_else(|| anyhow!("CSV must contain a '{}' column", CONTENT_COLUMN))?;

    let records = lines
        .filter(|line| {
            line.split(',')
                .nth(content_idx)
                .is_some_and(|cell| !cell.trim().is_empty())
        })
        .count();

    tracing::debug!("Parsed {} CSV records", records);

    Ok(json!({
        "message": "File ingested",
        "records": records,
    }))
}

/// Payload: `{"query": "<text>"}`.
pub async fn run_query(payload: Value) -> Result<Value> {
    let query = payload
        .get("query")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .context("payload is missing a non-empty 'query' field")?;

    Ok(json!({
        "query": query,
        "results": [],
    }))
}
