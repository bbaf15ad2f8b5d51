//! Sharded Cache Module
//!
//! Splits the key space across a fixed number of independently locked shards.
//! Each key is routed by a 32-bit FNV-1 hash; whole-cache operations visit the
//! shards one at a time and are not atomic across them.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::cache::{CacheStats, Expiration, KeyValueCache, Shard};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::hooks::Hooks;
use crate::models::{snapshot, Value};
use crate::tasks::{Janitor, Sweep};

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1 hash of `key`.
fn fnv1_32(key: &str) -> u32 {
    key.bytes().fold(FNV32_OFFSET_BASIS, |hash, byte| {
        hash.wrapping_mul(FNV32_PRIME) ^ u32::from(byte)
    })
}

/// Index of the shard that owns `key` among `shard_count` shards.
///
/// # Panics
/// Panics if `shard_count` is zero.
pub fn bucket_for(key: &str, shard_count: usize) -> usize {
    fnv1_32(key) as usize % shard_count
}

#[derive(Debug)]
struct ShardSet {
    shards: Box<[Shard]>,
}

impl Sweep for ShardSet {
    fn sweep(&self) -> usize {
        self.shards.iter().map(Shard::delete_expired).sum()
    }
}

// == Sharded Cache ==
/// In-memory cache partitioned across N shards, sharing one janitor.
#[derive(Debug)]
pub struct ShardedCache {
    inner: Arc<ShardSet>,
    hooks: Hooks,
    janitor: Option<Janitor>,
}

impl ShardedCache {
    // == Constructor ==
    /// Creates `config.shard_count` shards sharing the configured default
    /// expiration.
    ///
    /// A cleanup interval spawns one janitor for all shards on the current
    /// tokio runtime and fails with [`CacheError::NoRuntime`] outside of one.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let shards = (0..config.shard_count)
            .map(|_| Shard::new(config.default_expiration))
            .collect();
        let inner = Arc::new(ShardSet { shards });

        let janitor = match config.cleanup_interval {
            Some(interval) if !interval.is_zero() => {
                let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
                Some(Janitor::spawn(&inner, interval, &runtime))
            }
            _ => None,
        };

        Ok(Self {
            inner,
            hooks: config.hooks(),
            janitor,
        })
    }

    pub fn shard_count(&self) -> usize {
        self.inner.shards.len()
    }

    /// Index of the shard that owns `key`.
    pub fn bucket(&self, key: &str) -> usize {
        bucket_for(key, self.shard_count())
    }

    fn shard(&self, key: &str) -> &Shard {
        &self.inner.shards[self.bucket(key)]
    }

    pub fn default_expiration(&self) -> Option<Duration> {
        self.inner.shards[0].default_expiration()
    }

    pub fn janitor(&self) -> Option<&Janitor> {
        self.janitor.as_ref()
    }

    /// Stops the shared janitor, if any. Safe to call repeatedly.
    pub fn close(&self) {
        if let Some(janitor) = &self.janitor {
            janitor.stop();
        }
    }

    /// Per-shard statistics, in shard order.
    pub fn shard_stats(&self) -> Vec<CacheStats> {
        self.inner.shards.iter().map(Shard::stats).collect()
    }

    /// Statistics summed across all shards.
    pub fn stats(&self) -> CacheStats {
        self.inner
            .shards
            .iter()
            .fold(CacheStats::new(), |mut total, shard| {
                total.absorb(&shard.stats());
                total
            })
    }

    pub fn len(&self) -> usize {
        self.inner.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.shards.iter().all(Shard::is_empty)
    }
}

impl KeyValueCache for ShardedCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.hooks.traced("get", || self.shard(key).get(key))
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.hooks
            .traced("get_string", || self.shard(key).get_string(key))
    }

    fn set(&self, key: &str, value: Value, expiration: Expiration) {
        self.hooks
            .traced("set", || self.shard(key).set(key, value, expiration));
    }

    fn exists(&self, key: &str) -> bool {
        self.hooks.traced("exists", || self.shard(key).exists(key))
    }

    fn delete(&self, key: &str) -> Result<u64> {
        self.hooks.traced("delete", || self.shard(key).delete(key))
    }

    fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        self.hooks
            .traced("increment", || self.shard(key).increment(key, delta))
    }

    fn increment_float(&self, key: &str, delta: f64) -> Result<f64> {
        self.hooks.traced("increment_float", || {
            self.shard(key).increment_float(key, delta)
        })
    }

    fn decrement(&self, key: &str, delta: i64) -> Result<i64> {
        self.hooks
            .traced("decrement", || self.shard(key).decrement(key, delta))
    }

    fn delete_expired(&self) -> usize {
        self.hooks.traced("delete_expired", || self.inner.sweep())
    }

    fn flush(&self) {
        self.hooks.traced("flush", || {
            for shard in self.inner.shards.iter() {
                shard.flush();
            }
        });
    }

    /// Copies each shard under its own lock, then encodes the combined map.
    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        self.hooks
            .traced("save", || {
                let mut items = HashMap::new();
                for shard in self.inner.shards.iter() {
                    shard.collect_into(&mut items);
                }
                snapshot::encode(writer, &items)
            })
            .inspect_err(|err| self.hooks.log_error(&format!("Cache save failed: {err}")))
    }

    /// Decodes the snapshot, then merges each item into the shard that owns it.
    fn load(&self, reader: &mut dyn Read) -> Result<usize> {
        self.hooks
            .traced("load", || -> Result<usize> {
                let mut routed: Vec<HashMap<_, _>> =
                    (0..self.shard_count()).map(|_| HashMap::new()).collect();
                for (key, item) in snapshot::decode(reader)? {
                    routed[self.bucket(&key)].insert(key, item);
                }
                Ok(routed
                    .into_iter()
                    .zip(self.inner.shards.iter())
                    .map(|(items, shard)| shard.merge(items))
                    .sum())
            })
            .inspect_err(|err| self.hooks.log_error(&format!("Cache load failed: {err}")))
    }
}
