use crate::membership::types::NodeId;

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Runtime configuration for one fleet node.
///
/// Every flag can also come from the environment, so containers only need env vars.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fleet-node",
    about = "Fleet coordination node: heartbeats, fleet view and task registry"
)]
pub struct NodeConfig {
    /// Address the HTTP API listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Stable node identity; defaults to {hostname}-{port}-{random suffix}
    #[arg(long, env = "NODE_ID")]
    pub node_id: Option<String>,

    /// Shared store URL (e.g. redis://127.0.0.1:6379). Without it the node keeps state
    /// in process and runs standalone.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Heartbeat publish interval in milliseconds
    #[arg(long, env = "HEARTBEAT_INTERVAL_MS", default_value = "1000")]
    pub heartbeat_interval_ms: u64,

    /// Seconds a heartbeat record lives without a refresh
    #[arg(long, env = "NODE_TTL_SECS", default_value = "10")]
    pub node_ttl_secs: u64,

    /// Push interval for WebSocket streams in milliseconds
    #[arg(long, env = "STREAM_INTERVAL_MS", default_value = "1000")]
    pub stream_interval_ms: u64,

    /// Number of local job workers
    #[arg(long, env = "WORKERS", default_value = "4")]
    pub workers: usize,

    /// Allowed CORS origin (repeatable)
    #[arg(
        long = "cors-origin",
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    pub cors_origins: Vec<String>,
}

impl NodeConfig {
    /// The configured identity, or a freshly generated one. Call once per process.
    pub fn resolve_node_id(&self) -> NodeId {
        match &self.node_id {
            Some(id) if !id.trim().is_empty() => NodeId::new(id.trim()),
            _ => NodeId::generate(sysinfo::System::host_name().as_deref(), self.bind.port()),
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn node_ttl(&self) -> Duration {
        Duration::from_secs(self.node_ttl_secs)
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }

    /// Rejects settings under which the fleet view would flap or nothing would run.
    pub fn validate(&self) -> Result<(), String> {
        if self.heartbeat_interval_ms == 0 {
            return Err("heartbeat interval must be greater than zero".to_string());
        }
        if self.node_ttl() <= self.heartbeat_interval() {
            return Err(format!(
                "node TTL ({}s) must be longer than the heartbeat interval ({}ms)",
                self.node_ttl_secs, self.heartbeat_interval_ms
            ));
        }
        if self.stream_interval_ms == 0 {
            return Err("stream interval must be greater than zero".to_string());
        }
        if self.workers == 0 {
            return Err("at least one worker is required".to_string());
        }
        Ok(())
    }
}
