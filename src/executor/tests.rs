//! Executor Module Tests
//!
//! ## Test Scopes
//! - **Registry**: handler registration, lookup and execution mechanics.
//! - **Data Types**: task state encoding and the persisted entry format.
//! - **Local Engine**: submission, worker lifecycle (PENDING -> RUNNING -> SUCCESS/FAILED),
//!   revocation rules and status lookups against a failing store.
//! - **Built-in Jobs**: CSV row counting and query payload validation.

#[cfg(test)]
mod tests {
    use crate::error::{CoordError, Result};
    use crate::executor::engine::ExecutionEngine;
    use crate::executor::executor::LocalEngine;
    use crate::executor::jobs::{
        INGEST_CSV, QUERY, QUOTED_FIELDS_ERROR, ingest_csv, register_builtin_jobs, run_query,
    };
    use crate::executor::registry::JobHandlerRegistry;
    use crate::executor::types::{Job, TaskEntry, TaskId, TaskState};
    use crate::membership::types::NodeId;
    use crate::storage::store::task_meta_key;
    use crate::storage::{MemoryStore, SharedStore};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio_util::sync::CancellationToken;

    async fn echo(payload: Value) -> anyhow::Result<Value> {
        Ok(json!({ "echo": payload }))
    }

    async fn explode(_payload: Value) -> anyhow::Result<Value> {
        panic!("handler blew up")
    }

    /// Memory store with a round trip of `latency`: reads see the data as of the request,
    /// writes land when the call returns.
    struct SlowStore {
        inner: MemoryStore,
        latency: Duration,
    }

    #[async_trait]
    impl SharedStore for SlowStore {
        async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
            tokio::time::sleep(self.latency).await;
            self.inner.set_with_ttl(key, value, ttl).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            tokio::time::sleep(self.latency).await;
            self.inner.set(key, value).await
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            let value = self.inner.get(key).await;
            tokio::time::sleep(self.latency).await;
            value
        }

        async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
            let value = self.inner.scan_keys(prefix).await;
            tokio::time::sleep(self.latency).await;
            value
        }

        async fn set_add(&self, set_key: &str, member: &str) -> Result<()> {
            tokio::time::sleep(self.latency).await;
            self.inner.set_add(set_key, member).await
        }

        async fn set_remove(&self, set_key: &str, member: &str) -> Result<()> {
            tokio::time::sleep(self.latency).await;
            self.inner.set_remove(set_key, member).await
        }

        async fn set_members(&self, set_key: &str) -> Result<Vec<String>> {
            let value = self.inner.set_members(set_key).await;
            tokio::time::sleep(self.latency).await;
            value
        }
    }

    fn engine_with(
        store: &Arc<MemoryStore>,
        registry: Arc<JobHandlerRegistry>,
    ) -> Arc<LocalEngine> {
        LocalEngine::new(NodeId::new("worker-node"), store.clone(), registry, 2)
    }

    async fn wait_until_ready(engine: &LocalEngine, task_id: &TaskId) -> TaskState {
        for _ in 0..200 {
            if let Some(status) = engine.get_status(task_id).await.unwrap() {
                if status.state.is_ready() {
                    return status.state;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("task {} never finished", task_id);
    }

    // ============================================================
    // REGISTRY
    // ============================================================

    #[tokio::test]
    async fn test_registry_register_and_execute() {
        // ARRANGE
        let registry = JobHandlerRegistry::new();
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        registry.register("count", move |_payload| {
            let count = call_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(json!("done"))
            }
        });

        // ASSERT: Handler is registered
        assert!(registry.has_handler("count"));
        assert_eq!(registry.handler_count(), 1);
        assert_eq!(registry.list_handlers(), vec!["count".to_string()]);

        // ACT
        let result = registry.execute(&Job::new("count", json!({}))).await;

        // ASSERT
        assert_eq!(result.unwrap(), json!("done"));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registry_unknown_handler_returns_error() {
        let registry = JobHandlerRegistry::new();

        let result = registry.execute(&Job::new("missing", json!({}))).await;

        assert!(result.unwrap_err().to_string().contains("Unknown job handler"));
    }

    #[tokio::test]
    async fn test_registry_handler_receives_payload() {
        let registry = JobHandlerRegistry::new();
        registry.register("echo", echo);

        let result = registry
            .execute(&Job::new("echo", json!({"query": "SELECT 1"})))
            .await
            .unwrap();

        assert_eq!(result["echo"]["query"], "SELECT 1");
    }

    // ============================================================
    // DATA TYPES
    // ============================================================

    #[test]
    fn test_task_state_labels() {
        assert_eq!(TaskState::Pending.to_string(), "PENDING");
        assert_eq!(TaskState::Running.to_string(), "RUNNING");
        assert_eq!(TaskState::Success { result: json!(1) }.label(), "SUCCESS");
        assert_eq!(TaskState::Failed { error: "x".into() }.label(), "FAILED");
        assert_eq!(TaskState::Revoked.label(), "REVOKED");

        assert!(!TaskState::Pending.is_ready());
        assert!(!TaskState::Running.is_ready());
        assert!(TaskState::Revoked.is_ready());
    }

    #[test]
    fn test_task_entry_encoding() {
        let mut entry = TaskEntry::pending(Job::new("query", json!({"query": "q"})));
        entry.owning_node = Some(NodeId::new("n1"));
        entry.transition(TaskState::Failed {
            error: "bad query".to_string(),
        });

        let raw = serde_json::to_value(&entry).unwrap();
        assert_eq!(raw["state"], "FAILED");
        assert_eq!(raw["error"], "bad query");
        assert_eq!(raw["owning_node"], "n1");
        assert!(raw.get("result").is_none());

        let decoded: TaskEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(decoded.state, entry.state);
        assert!(decoded.updated_at >= decoded.created_at);
    }

    #[test]
    fn test_task_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    // ============================================================
    // LOCAL ENGINE
    // ============================================================

    #[tokio::test]
    async fn test_submit_records_pending_task() {
        let store = Arc::new(MemoryStore::new());
        let registry = JobHandlerRegistry::new();
        registry.register("echo", echo);
        let engine = engine_with(&store, registry);

        let task_id = engine.submit_job(Job::new("echo", json!({}))).await.unwrap();

        let status = engine.get_status(&task_id).await.unwrap().unwrap();
        assert_eq!(status.state, TaskState::Pending);
        assert_eq!(status.owning_node, None);
        assert!(
            store
                .get(&task_meta_key(task_id.as_str()))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_job_kind() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_with(&store, JobHandlerRegistry::new());

        let result = engine.submit_job(Job::new("nope", json!({}))).await;

        assert!(matches!(result, Err(CoordError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_worker_runs_task_to_success() {
        let store = Arc::new(MemoryStore::new());
        let registry = JobHandlerRegistry::new();
        registry.register("echo", echo);
        let engine = engine_with(&store, registry);
        let shutdown = CancellationToken::new();
        let workers = engine.start(shutdown.clone());

        let task_id = engine
            .submit_job(Job::new("echo", json!({"n": 7})))
            .await
            .unwrap();

        let state = wait_until_ready(&engine, &task_id).await;
        assert_eq!(
            state,
            TaskState::Success {
                result: json!({"echo": {"n": 7}})
            }
        );

        let status = engine.get_status(&task_id).await.unwrap().unwrap();
        assert_eq!(status.owning_node, Some(NodeId::new("worker-node")));

        shutdown.cancel();
        for worker in workers {
            worker.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_handler_error_and_panic_become_failed() {
        let store = Arc::new(MemoryStore::new());
        let registry = JobHandlerRegistry::new();
        registry.register("reject", |_payload| async {
            Err::<Value, _>(anyhow::anyhow!("malformed csv"))
        });
        registry.register("explode", explode);
        let engine = engine_with(&store, registry);
        let shutdown = CancellationToken::new();
        engine.start(shutdown.clone());

        let rejected = engine.submit_job(Job::new("reject", json!({}))).await.unwrap();
        let exploded = engine.submit_job(Job::new("explode", json!({}))).await.unwrap();

        match wait_until_ready(&engine, &rejected).await {
            TaskState::Failed { error } => assert!(error.contains("malformed csv")),
            other => panic!("unexpected state {other}"),
        }
        match wait_until_ready(&engine, &exploded).await {
            TaskState::Failed { error } => assert!(error.contains("panicked")),
            other => panic!("unexpected state {other}"),
        }

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_revoked_task_is_never_run() {
        let store = Arc::new(MemoryStore::new());
        let registry = JobHandlerRegistry::new();
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();
        registry.register("count", move |_payload| {
            let count = call_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            }
        });
        let engine = engine_with(&store, registry);

        // Workers not started yet, so the task stays PENDING.
        let task_id = engine.submit_job(Job::new("count", json!({}))).await.unwrap();
        engine.revoke(&task_id).await.unwrap();

        let shutdown = CancellationToken::new();
        engine.start(shutdown.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let status = engine.get_status(&task_id).await.unwrap().unwrap();
        assert_eq!(status.state, TaskState::Revoked);
        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_revoke_rules() {
        let store = Arc::new(MemoryStore::new());
        let registry = JobHandlerRegistry::new();
        registry.register("echo", echo);
        let engine = engine_with(&store, registry);
        let shutdown = CancellationToken::new();
        engine.start(shutdown.clone());

        // Unknown id
        let missing = engine.revoke(&TaskId::from("ghost".to_string())).await;
        assert!(matches!(missing, Err(CoordError::TaskNotFound(_))));

        // Finished task
        let task_id = engine.submit_job(Job::new("echo", json!({}))).await.unwrap();
        wait_until_ready(&engine, &task_id).await;

        match engine.revoke(&task_id).await {
            Err(CoordError::InvalidState { status, .. }) => assert_eq!(status, "SUCCESS"),
            other => panic!("expected InvalidState, got {other:?}"),
        }

        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_revoke_during_slow_claim_is_rejected() {
        // ARRANGE: every store call takes 100ms, the job takes 500ms
        let store = Arc::new(SlowStore {
            inner: MemoryStore::new(),
            latency: Duration::from_millis(100),
        });
        let registry = JobHandlerRegistry::new();
        registry.register("slow", |_payload| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(json!("ran"))
        });
        let engine = LocalEngine::new(NodeId::new("worker-node"), store.clone(), registry, 1);
        let task_id = engine.submit_job(Job::new("slow", json!({}))).await.unwrap();

        let shutdown = CancellationToken::new();
        engine.start(shutdown.clone());

        // ACT: revoke lands after the worker read PENDING but before RUNNING is written
        tokio::time::sleep(Duration::from_millis(101)).await;
        let revoke = engine.revoke(&task_id).await;

        // ASSERT: the revoke sees the claim and the task finishes normally
        match revoke {
            Err(CoordError::InvalidState { status, .. }) => assert_eq!(status, "RUNNING"),
            other => panic!("expected InvalidState, got {other:?}"),
        }
        assert_eq!(
            wait_until_ready(&engine, &task_id).await,
            TaskState::Success {
                result: json!("ran")
            }
        );

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_outcome_never_overwrites_revoked_record() {
        // ARRANGE: a job that blocks until released
        let store = Arc::new(MemoryStore::new());
        let gate = Arc::new(Notify::new());
        let finished = Arc::new(AtomicUsize::new(0));
        let registry = JobHandlerRegistry::new();
        {
            let gate = gate.clone();
            let finished = finished.clone();
            registry.register("gated", move |_payload| {
                let gate = gate.clone();
                let finished = finished.clone();
                async move {
                    gate.notified().await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    Ok(json!("ran"))
                }
            });
        }
        let engine = engine_with(&store, registry);
        let shutdown = CancellationToken::new();
        engine.start(shutdown.clone());

        let task_id = engine.submit_job(Job::new("gated", json!({}))).await.unwrap();
        for _ in 0..200 {
            let status = engine.get_status(&task_id).await.unwrap().unwrap();
            if status.state == TaskState::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // ACT: the record is revoked elsewhere while the job runs, then the job finishes
        let key = task_meta_key(task_id.as_str());
        let raw = store.get(&key).await.unwrap().unwrap();
        let mut entry: TaskEntry = serde_json::from_str(&raw).unwrap();
        assert_eq!(entry.state, TaskState::Running);
        entry.transition(TaskState::Revoked);
        store
            .set(&key, &serde_json::to_string(&entry).unwrap())
            .await
            .unwrap();

        gate.notify_one();
        for _ in 0..200 {
            if finished.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        // ASSERT: REVOKED stays terminal
        let status = engine.get_status(&task_id).await.unwrap().unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(status.state, TaskState::Revoked);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_get_status_unknown_id_is_none() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_with(&store, JobHandlerRegistry::new());

        let status = engine.get_status(&TaskId::from("ghost".to_string())).await;

        assert!(status.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_status_failure_modes() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_with(&store, JobHandlerRegistry::new());
        let broken = TaskId::from("broken".to_string());
        store
            .set(&task_meta_key(broken.as_str()), "{\"state\":\"EXPLODED\"}")
            .await
            .unwrap();

        assert!(matches!(
            engine.get_status(&broken).await,
            Err(CoordError::RecordCorrupt { .. })
        ));

        store.set_unavailable(true);
        assert!(matches!(
            engine.get_status(&broken).await,
            Err(CoordError::EngineLookup { .. })
        ));
    }

    // ============================================================
    // BUILT-IN JOBS
    // ============================================================

    #[tokio::test]
    async fn test_ingest_csv_counts_rows_with_content() {
        let csv = "source,content\nwiki,Rust is a language\nwiki,\n\nblog,Ownership\n";

        let result = ingest_csv(json!({ "csv": csv })).await.unwrap();

        assert_eq!(result["records"], 2);
    }

    #[tokio::test]
    async fn test_ingest_csv_requires_content_column() {
        let missing_column = ingest_csv(json!({ "csv": "a,b\n1,2\n" })).await;
        assert!(missing_column.unwrap_err().to_string().contains("content"));

        assert!(ingest_csv(json!({ "csv": "" })).await.is_err());
        assert!(ingest_csv(json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_ingest_csv_rejects_quoted_fields() {
        // An embedded comma would shift the content cell; refuse rather than miscount.
        let csv = "source,content\n\"Smith, J\",Rust\nwiki,\n";

        let err = ingest_csv(json!({ "csv": csv })).await.unwrap_err();

        assert_eq!(err.to_string(), QUOTED_FIELDS_ERROR);
    }

    #[tokio::test]
    async fn test_query_job_echoes_query() {
        let result = run_query(json!({ "query": "  what is rust " })).await.unwrap();
        assert_eq!(result["query"], "what is rust");
        assert_eq!(result["results"], json!([]));

        assert!(run_query(json!({ "query": " " })).await.is_err());
    }

    #[test]
    fn test_builtin_jobs_registered() {
        let registry = JobHandlerRegistry::new();
        register_builtin_jobs(&registry);

        assert!(registry.has_handler(INGEST_CSV));
        assert!(registry.has_handler(QUERY));
    }
}
