//! Redis-backed shared store.
//!
//! | Store operation | Redis command |
//! |-----------------|---------------|
//! | `set_with_ttl`  | `SET key value EX ttl` |
//! | `set`           | `SET key value` |
//! | `get`           | `GET key` |
//! | `scan_keys`     | `SCAN MATCH prefix*` |
//! | `set_add`       | `SADD` |
//! | `set_remove`    | `SREM` |
//! | `set_members`   | `SMEMBERS` |
//!
//! Redis expires TTL keys on its own, which is what makes a silent node disappear from the
//! fleet view.

use super::store::SharedStore;
use crate::error::{CoordError, Result};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::time::Duration;

/// Shared store over a multiplexed Redis connection. Clones share one TCP connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connects to `redis://[:<password>@]<host>:<port>[/<db>]`, failing fast if the
    /// server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(store_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(store_error)?;

        tracing::info!("Connected to Redis shared store");

        Ok(Self { conn })
    }
}

fn store_error(err: redis::RedisError) -> CoordError {
    CoordError::StoreUnavailable(err.to_string())
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        // Redis rejects EX 0.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(store_error)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await.map_err(store_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key).await.map_err(store_error)
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);

        let mut keys = Vec::new();
        let mut iter = conn
            .scan_match::<_, String>(pattern)
            .await
            .map_err(store_error)?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }

        Ok(keys)
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(set_key, member)
            .await
            .map_err(store_error)
    }

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(set_key, member)
            .await
            .map_err(store_error)
    }

    async fn set_members(&self, set_key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.smembers::<_, Vec<String>>(set_key)
            .await
            .map_err(store_error)
    }
}
