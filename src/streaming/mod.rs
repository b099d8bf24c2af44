//! Live Streaming Module
//!
//! Pushes fleet and task snapshots to WebSocket subscribers on a fixed cadence. Each
//! subscriber gets its own loop, cancelled as soon as the peer disconnects or the node
//! shuts down.

pub mod adapter;
pub mod handlers;

pub use adapter::{SnapshotSource, StreamAdapter, StreamSettings};
