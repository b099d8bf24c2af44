//! Job Handler Registry
//!
//! Maps handler names (e.g. "ingest_csv", "query") to async closures. The engine stays
//! generic; the binary decides which kinds of work a node can run.

use super::types::Job;

use anyhow::Result;
use dashmap::DashMap;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type-erased async handler: payload in, result payload out.
pub type JobHandlerFn =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send>> + Send + Sync>;

pub struct JobHandlerRegistry {
    handlers: DashMap<String, JobHandlerFn>,
}

impl JobHandlerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `handler` under `handler_name`, replacing any previous registration.
    pub fn register<F, Fut>(&self, handler_name: &str, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        // Box::pin erases the concrete future type so different closures share one map.
        let handler_fn: JobHandlerFn = Arc::new(move |payload: Value| {
            Box::pin(handler(payload)) as Pin<Box<dyn Future<Output = Result<Value>> + Send>>
        });

        self.handlers.insert(handler_name.to_string(), handler_fn);

        tracing::info!("Registered job handler: {}", handler_name);
    }

    /// Runs the handler named by `job.handler` with the job's payload.
    pub async fn execute(&self, job: &Job) -> Result<Value> {
        // Clone the Arc out so no map guard is held across the await.
        let handler_fn = self
            .handlers
            .get(&job.handler)
            .map(|entry| entry.value().clone());

        match handler_fn {
            Some(handler_fn) => {
                tracing::debug!(
                    "Executing job with handler '{}' (payload size: {} bytes)",
                    job.handler,
                    job.payload.to_string().len()
                );
                handler_fn(job.payload.clone()).await
            }
            None => {
                let error = format!("Unknown job handler: {}", job.handler);
                tracing::error!("{}", error);
                Err(anyhow::anyhow!(error))
            }
        }
    }

    pub fn list_handlers(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn has_handler(&self, handler_name: &str) -> bool {
        self.handlers.contains_key(handler_name)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for JobHandlerRegistry {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}
