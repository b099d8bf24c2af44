//! Membership & Liveness Module
//!
//! Every node advertises itself by periodically writing a self-expiring status record into
//! the shared store. The fleet is whatever set of records has not expired yet.
//!
//! ## Core Mechanisms
//! - **Heartbeat**: `HeartbeatPublisher` samples CPU/memory once per second and rewrites
//!   `node_stats:{node_id}` with a 10 second TTL.
//! - **Failure Detection**: none beyond the TTL. A crashed or partitioned node stops
//!   refreshing and silently drops out; it reappears on its next successful write.
//! - **Fleet View**: `FleetView` enumerates live records on demand and tolerates malformed
//!   peers by skipping them.

pub mod handlers;
pub mod heartbeat;
pub mod protocol;
pub mod sampler;
pub mod service;
pub mod types;

pub use heartbeat::HeartbeatPublisher;
pub use service::FleetView;
pub use types::{NodeId, NodeStatus};
