//! Shared State Store Module
//!
//! The single source of truth for cross-process coordination. Heartbeats, the task-id set
//! and the reference engine's status records all live here.
//!
//! ## Backends
//! - **`memory`**: `MemoryStore`, an in-process DashMap store with lazy TTL expiry and a
//!   fault-injection switch. Used for single-node mode and tests.
//! - **`redis`** (feature `redis`): `RedisStore`, the production backend shared by the fleet.
//!
//! The `store` submodule defines the `SharedStore` contract and the key schema.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod store;

pub use memory::MemoryStore;
pub use store::SharedStore;
