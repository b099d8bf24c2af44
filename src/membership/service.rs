use super::types::NodeStatus;
use crate::error::Result;
use crate::storage::SharedStore;
use crate::storage::store::NODE_STATS_PREFIX;

use std::sync::Arc;

/// Read side of the heartbeat protocol: the set of nodes whose records have not expired.
#[derive(Clone)]
pub struct FleetView {
    store: Arc<dyn SharedStore>,
}

impl FleetView {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Snapshot of every live node, in no particular order.
    ///
    /// An empty fleet is `Ok(vec![])`. Only a store failure is an error; a peer that wrote
    /// garbage is logged and left out.
    pub async fn list_nodes(&self) -> Result<Vec<NodeStatus>> {
        let keys = self.store.scan_keys(NODE_STATS_PREFIX).await?;
        let mut nodes = Vec::with_capacity(keys.len());

        for key in keys {
            // Expired between scan and fetch.
            let Some(raw) = self.store.get(&key).await? else {
                tracing::debug!("Heartbeat {} expired during listing", key);
                continue;
            };

            match serde_json::from_str::<NodeStatus>(&raw) {
                Ok(status) => nodes.push(status),
                Err(e) => {
                    tracing::error!("Failed to decode heartbeat record {}: {}", key, e);
                }
            }
        }

        if nodes.is_empty() {
            tracing::debug!("No live node heartbeats found");
        }

        Ok(nodes)
    }
}
