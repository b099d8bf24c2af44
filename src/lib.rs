//! Fleet Coordination Library
//!
//! Lets every worker node in a fleet (a) publish its own liveness and resource usage and
//! see which peers are alive, and (b) track jobs submitted anywhere in the fleet, with
//! synchronous queries and live WebSocket streams.
//!
//! ## Modules
//! - **`storage`**: the shared state store (`SharedStore`), backed by Redis or in memory.
//! - **`membership`**: heartbeat publisher (TTL-expiring records) and the fleet view.
//! - **`executor`**: the execution engine boundary and the in-process `LocalEngine`.
//! - **`tasks`**: the shared task registry merging set membership with engine status.
//! - **`streaming`**: per-subscriber periodic snapshot push over WebSocket.
//! - **`server`**, **`config`**, **`shutdown`**: process wiring.

pub mod config;
pub mod error;
pub mod executor;
pub mod membership;
pub mod server;
pub mod shutdown;
pub mod storage;
pub mod streaming;
pub mod tasks;

pub use error::{CoordError, Result};
