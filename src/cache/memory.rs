//! Memory Cache Module
//!
//! Unsharded cache: one locked key space, an optional janitor and the
//! configured observability hooks.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::cache::{CacheStats, Expiration, KeyValueCache, Shard};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::hooks::Hooks;
use crate::models::Value;
use crate::tasks::Janitor;

// == Memory Cache ==
/// Thread-safe in-memory cache with TTL expiration.
///
/// When built with a cleanup interval a janitor task sweeps expired items in
/// the background. Call [`MemoryCache::close`] (or drop the cache) to stop it.
#[derive(Debug)]
pub struct MemoryCache {
    shard: Arc<Shard>,
    hooks: Hooks,
    janitor: Option<Janitor>,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates a cache from `config`.
    ///
    /// A cleanup interval spawns the janitor on the current tokio runtime and
    /// fails with [`CacheError::NoRuntime`] outside of one.
    pub fn new(config: CacheConfig) -> Result<Self> {
        let shard = Arc::new(Shard::new(config.default_expiration));
        let janitor = match config.cleanup_interval {
            Some(interval) if !interval.is_zero() => {
                let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
                Some(Janitor::spawn(&shard, interval, &runtime))
            }
            _ => None,
        };

        Ok(Self {
            shard,
            hooks: config.hooks(),
            janitor,
        })
    }

    pub fn default_expiration(&self) -> Option<Duration> {
        self.shard.default_expiration()
    }

    pub fn janitor(&self) -> Option<&Janitor> {
        self.janitor.as_ref()
    }

    /// Stops the janitor, if any. Safe to call repeatedly.
    pub fn close(&self) {
        if let Some(janitor) = &self.janitor {
            janitor.stop();
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.shard.stats()
    }

    /// Number of stored items, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.shard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shard.is_empty()
    }
}

impl KeyValueCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.hooks.traced("get", || self.shard.get(key))
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.hooks.traced("get_string", || self.shard.get_string(key))
    }

    fn set(&self, key: &str, value: Value, expiration: Expiration) {
        self.hooks
            .traced("set", || self.shard.set(key, value, expiration));
    }

    fn exists(&self, key: &str) -> bool {
        self.hooks.traced("exists", || self.shard.exists(key))
    }

    fn delete(&self, key: &str) -> Result<u64> {
        self.hooks.traced("delete", || self.shard.delete(key))
    }

    fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        self.hooks
            .traced("increment", || self.shard.increment(key, delta))
    }

    fn increment_float(&self, key: &str, delta: f64) -> Result<f64> {
        self.hooks
            .traced("increment_float", || self.shard.increment_float(key, delta))
    }

    fn decrement(&self, key: &str, delta: i64) -> Result<i64> {
        self.hooks
            .traced("decrement", || self.shard.decrement(key, delta))
    }

    fn delete_expired(&self) -> usize {
        self.hooks
            .traced("delete_expired", || self.shard.delete_expired())
    }

    fn flush(&self) {
        self.hooks.traced("flush", || self.shard.flush());
    }

    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        self.hooks
            .traced("save", || self.shard.save(writer))
            .inspect_err(|err| self.hooks.log_error(&format!("Cache save failed: {err}")))
    }

    fn load(&self, reader: &mut dyn Read) -> Result<usize> {
        self.hooks
            .traced("load", || self.shard.load(reader))
            .inspect_err(|err| self.hooks.log_error(&format!("Cache load failed: {err}")))
    }
}
