//! Periodic snapshot push.
//!
//! One [`StreamAdapter::run`] loop per subscriber: every tick it takes a snapshot from its
//! [`SnapshotSource`] and pushes it as a JSON text frame. Snapshot failures are reported
//! in-band and the loop keeps going; a failed push or a cancelled token ends it.

use crate::error::{CoordError, Result};
use crate::membership::service::FleetView;
use crate::tasks::registry::TaskRegistry;

use async_trait::async_trait;
use futures::{Sink, SinkExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const STREAM_INTERVAL: Duration = Duration::from_secs(1);

/// Something that can produce a point-in-time JSON snapshot for subscribers.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn snapshot(&self) -> Result<Value>;
}

#[async_trait]
impl SnapshotSource for FleetView {
    fn name(&self) -> &'static str {
        "nodes"
    }

    async fn snapshot(&self) -> Result<Value> {
        let nodes = self.list_nodes().await?;
        Ok(json!({ "nodes": nodes }))
    }
}

#[async_trait]
impl SnapshotSource for TaskRegistry {
    fn name(&self) -> &'static str {
        "tasks"
    }

    async fn snapshot(&self) -> Result<Value> {
        let tasks = self.list().await?;
        Ok(json!({ "tasks": tasks }))
    }
}

/// Settings shared by every streaming endpoint.
#[derive(Clone)]
pub struct StreamSettings {
    pub interval: Duration,
    /// Process-wide shutdown; each subscriber loop runs on a child of it.
    pub shutdown: CancellationToken,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            interval: STREAM_INTERVAL,
            shutdown: CancellationToken::new(),
        }
    }
}

pub struct StreamAdapter<S> {
    source: S,
    interval: Duration,
}

impl<S: SnapshotSource> StreamAdapter<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Pushes one frame per tick into `sink` until `closed` fires or a push fails.
    ///
    /// The first frame goes out immediately. Returns the number of frames delivered.
    pub async fn run<K>(&self, sink: K, closed: CancellationToken) -> usize
    where
        K: Sink<String>,
        K::Error: std::fmt::Display,
    {
        let mut sink = std::pin::pin!(sink);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sent = 0usize;

        tracing::debug!("{} stream subscriber attached", self.source.name());

        loop {
            tokio::select! {
                _ = closed.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // A slow snapshot must not outlive the subscriber.
            let frame = tokio::select! {
                _ = closed.cancelled() => break,
                frame = self.next_frame() => frame,
            };

            if let Err(e) = sink.as_mut().send(frame).await {
                tracing::debug!("{} stream push failed: {}", self.source.name(), e);
                break;
            }
            sent += 1;
        }

        tracing::debug!(
            "{} stream subscriber released after {} frames",
            self.source.name(),
            sent
        );

        sent
    }

    async fn next_frame(&self) -> String {
        match self.source.snapshot().await {
            Ok(snapshot) => snapshot.to_string(),
            Err(e) => {
                tracing::warn!("{} snapshot failed: {}", self.source.name(), e);
                error_frame(&e)
            }
        }
    }
}

/// In-band failure notification: `{"error": <kind>, "detail": <message>}`.
pub fn error_frame(error: &CoordError) -> String {
    json!({ "error": error.kind(), "detail": error.to_string() }).to_string()
}
