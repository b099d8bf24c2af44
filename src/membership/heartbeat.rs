//! Heartbeat Publisher
//!
//! Every tick the node samples its own CPU/memory and rewrites `node_stats:{node_id}` with a
//! TTL. There is no delete path: a node that stops publishing simply expires out of the fleet
//! view once the TTL runs out, which is the fleet's only failure detector.

use super::sampler::MetricsSampler;
use super::types::{NodeId, NodeStatus};
use crate::error::{CoordError, Result};
use crate::storage::SharedStore;
use crate::storage::store::node_stats_key;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
/// Ten missed ticks before a node is considered gone.
pub const NODE_TTL: Duration = Duration::from_secs(10);

pub struct HeartbeatPublisher {
    node_id: NodeId,
    store: Arc<dyn SharedStore>,
    sampler: Box<dyn MetricsSampler>,
    interval: Duration,
    ttl: Duration,
}

impl HeartbeatPublisher {
    pub fn new(
        node_id: NodeId,
        store: Arc<dyn SharedStore>,
        sampler: Box<dyn MetricsSampler>,
    ) -> Self {
        Self {
            node_id,
            store,
            sampler,
            interval: HEARTBEAT_INTERVAL,
            ttl: NODE_TTL,
        }
    }

    /// Overrides the tick period and record TTL. The TTL must outlive the tick.
    pub fn with_timing(mut self, interval: Duration, ttl: Duration) -> Self {
        self.interval = interval;
        self.ttl = ttl;
        self
    }

    /// Runs a single heartbeat tick.
    ///
    /// Returns `Ok(None)` when sampling failed and the write was skipped, so a half-read
    /// sample never replaces the last good record.
    pub async fn publish_once(&mut self) -> Result<Option<NodeStatus>> {
        let sample = match self.sampler.sample() {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(node = %self.node_id, "Skipping heartbeat: {}", e);
                return Ok(None);
            }
        };

        let status = NodeStatus::from_sample(self.node_id.clone(), sample);
        let payload = serde_json::to_string(&status)
            .map_err(|e| CoordError::Sampling(format!("failed to encode heartbeat: {}", e)))?;

        self.store
            .set_with_ttl(&node_stats_key(self.node_id.as_str()), &payload, self.ttl)
            .await?;

        tracing::debug!(
            node = %self.node_id,
            cpu = status.cpu_percent,
            mem = status.memory_percent,
            "Heartbeat published"
        );

        Ok(Some(status))
    }

    /// Publishes until `shutdown` fires. Failures are logged and retried on the next tick.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(
            node = %self.node_id,
            "Starting heartbeat publisher (interval={:?}, ttl={:?})",
            self.interval,
            self.ttl
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.publish_once().await {
                        tracing::warn!(node = %self.node_id, "Heartbeat write failed: {}", e);
                    }
                }
            }
        }

        tracing::info!(node = %self.node_id, "Heartbeat publisher stopped");
    }
}
