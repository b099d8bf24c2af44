//! In-process shared store.
//!
//! Backs single-node deployments and the test suite. Expiry is evaluated lazily against
//! `tokio::time::Instant`, so tests running on paused time can step over TTL boundaries
//! without sleeping.

use super::store::SharedStore;
use crate::error::{CoordError, Result};

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

pub struct MemoryStore {
    values: DashMap<String, StoredValue>,
    sets: DashMap<String, HashSet<String>>,
    /// Fault injection switch: when set, every call fails with `StoreUnavailable`.
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            sets: DashMap::new(),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulates the store going away (or coming back).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of live (unexpired) keys, ignoring sets.
    pub fn live_key_count(&self) -> usize {
        let now = Instant::now();
        self.values
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoordError::StoreUnavailable(
                "memory store is marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn write(&self, key: &str, value: &str, expires_at: Option<Instant>) {
        self.values.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at,
            },
        );
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.ensure_available()?;
        self.write(key, value, Some(Instant::now() + ttl));
        tracing::trace!("Stored {} with ttl {:?}", key, ttl);
        Ok(())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_available()?;
        self.write(key, value, None);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_available()?;
        let now = Instant::now();

        let expired = match self.values.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        // The shard guard above is released before removal.
        if expired {
            self.values.remove_if(key, |_, stored| stored.is_expired(now));
        }

        Ok(None)
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.ensure_available()?;
        let now = Instant::now();

        self.values.retain(|_, stored| !stored.is_expired(now));

        Ok(self
            .values
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<()> {
        self.ensure_available()?;
        self.sets
            .entry(set_key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<()> {
        self.ensure_available()?;
        if let Some(mut members) = self.sets.get_mut(set_key) {
            members.remove(member);
        }
        Ok(())
    }

    async fn set_members(&self, set_key: &str) -> Result<Vec<String>> {
        self.ensure_available()?;
        Ok(self
            .sets
            .get(set_key)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }
}
