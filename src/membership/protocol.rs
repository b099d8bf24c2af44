//! HTTP contracts for the fleet view.

use super::types::NodeStatus;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_NODES: &str = "/nodes";
pub const ENDPOINT_WS_NODES: &str = "/ws/nodes";

/// Payload of `GET /nodes` and of every `/ws/nodes` push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesResponse {
    pub nodes: Vec<NodeStatus>,
}
