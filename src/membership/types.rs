use serde::{Deserialize, Serialize};
use std::fmt;

/// Fleet-wide identity of one node process.
///
/// Stable for the lifetime of the process and unique across the fleet. It is the join key
/// between heartbeat records and the `owning_node` field of task records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identity for a node started without one, e.g. `worker-3-8001-1f0c9a2e`.
    ///
    /// The random suffix separates processes that share a hostname and port.
    pub fn generate(host: Option<&str>, port: u16) -> Self {
        let host = host
            .map(|h| {
                h.trim()
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
                    .collect::<String>()
            })
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "node".to_string());
        let suffix = uuid::Uuid::new_v4().simple().to_string();

        Self(format!("{}-{}-{}", host, port, &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One sample of local resource usage, already rounded for publication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
}

/// The heartbeat record a node publishes about itself.
///
/// Lives in the shared store under `node_stats:{node_id}` and expires unless refreshed.
/// `node` is accepted as an alias of `node_id` so records written by older nodes decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeStatus {
    #[serde(alias = "node")]
    pub node_id: NodeId,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
}

impl NodeStatus {
    pub fn from_sample(node_id: NodeId, sample: ResourceSample) -> Self {
        Self {
            node_id,
            cpu_percent: sample.cpu_percent,
            memory_percent: sample.memory_percent,
            memory_used_mb: sample.memory_used_mb,
            memory_total_mb: sample.memory_total_mb,
        }
    }
}
