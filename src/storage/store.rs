//! Shared State Store contract.
//!
//! The coordination layer never keeps cross-process state in memory. Everything that other
//! nodes must see goes through a [`SharedStore`], which only has to offer atomic single-key
//! reads/writes with optional expiry and set membership. No multi-key transactions are
//! assumed.

use crate::error::Result;

use async_trait::async_trait;
use std::time::Duration;

/// Key prefix for heartbeat records (`node_stats:{node_id}`).
pub const NODE_STATS_PREFIX: &str = "node_stats:";
/// Set holding every task id the registry knows about.
pub const TASK_IDS_KEY: &str = "task_ids";
/// Key prefix for the reference engine's status records (`task_meta:{task_id}`).
pub const TASK_META_PREFIX: &str = "task_meta:";

pub fn node_stats_key(node_id: &str) -> String {
    format!("{}{}", NODE_STATS_PREFIX, node_id)
}

pub fn task_meta_key(task_id: &str) -> String {
    format!("{}{}", TASK_META_PREFIX, task_id)
}

/// Low-level key-value and set operations against the shared store.
///
/// Implementations must be cheap to share behind an `Arc` and must map every
/// connectivity problem to [`CoordError::StoreUnavailable`](crate::error::CoordError).
/// "Key absent" is never an error: `get` returns `Ok(None)`.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Writes `value` under `key`, expiring it after `ttl` unless rewritten.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Writes `value` under `key` with no expiry.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Lists every live key starting with `prefix`. Order is unspecified.
    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>>;

    async fn set_add(&self, set_key: &str, member: &str) -> Result<()>;

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<()>;

    /// Returns all members of `set_key`; an unknown set is empty. Order is unspecified.
    async fn set_members(&self, set_key: &str) -> Result<Vec<String>>;
}
