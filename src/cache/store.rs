//! Cache Store Module
//!
//! Single key space: a HashMap of items with lazy expiration, numeric
//! arithmetic and snapshot persistence. Not synchronised; see [`Shard`].
//!
//! [`Shard`]: crate::cache::Shard

use std::collections::HashMap;
use std::io::{Read, Write};
use std::time::Duration;

use chrono::Utc;

use crate::cache::{CacheStats, Expiration, Item};
use crate::error::{CacheError, Result};
use crate::models::{snapshot, Value};

// == Cache Store ==
/// Key space with default expiration and lookup statistics.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    items: HashMap<String, Item>,
    /// Lifetime applied by `Expiration::Default`, None = never expire
    default_expiration: Option<Duration>,
    /// Lookup statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store. A zero default expiration means "never expire".
    pub fn new(default_expiration: Option<Duration>) -> Self {
        Self {
            items: HashMap::new(),
            default_expiration: default_expiration.filter(|d| !d.is_zero()),
            stats: CacheStats::new(),
        }
    }

    pub fn default_expiration(&self) -> Option<Duration> {
        self.default_expiration
    }

    // == Set ==
    /// Stores a value, replacing any existing item under `key`.
    pub fn set(&mut self, key: &str, value: Value, expiration: Expiration) {
        let ttl = expiration.resolve(self.default_expiration);
        self.items.insert(key.to_string(), Item::new(value, ttl));
    }

    /// Returns the live item under `key`, removing it first if it has expired.
    fn live_item(&mut self, key: &str) -> Option<&mut Item> {
        if self.items.get(key)?.is_expired() {
            self.items.remove(key);
            self.stats.record_expirations(1);
            return None;
        }
        self.items.get_mut(key)
    }

    fn live_item_or_miss(&mut self, key: &str) -> Result<&mut Item> {
        self.live_item(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Get ==
    /// Retrieves a copy of the value under `key`, if present and not expired.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let value = self.live_item(key).map(|item| item.value.clone());
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    /// Retrieves a string value. Absence is `Ok(None)`; a non-string value is
    /// an error.
    pub fn get_string(&mut self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(_) => Err(CacheError::WrongType {
                key: key.to_string(),
                expected: "a string",
            }),
        }
    }

    pub fn exists(&mut self, key: &str) -> bool {
        self.live_item(key).is_some()
    }

    // == Delete ==
    /// Removes `key`, returning the number of items removed.
    pub fn delete(&mut self, key: &str) -> Result<u64> {
        self.live_item_or_miss(key)?;
        self.items.remove(key);
        Ok(1)
    }

    // == Arithmetic ==
    /// Adds `delta` to an integer value, wrapping on overflow.
    pub fn increment(&mut self, key: &str, delta: i64) -> Result<i64> {
        self.live_item_or_miss(key)?
            .value
            .wrapping_increment(delta)
            .ok_or_else(|| CacheError::WrongType {
                key: key.to_string(),
                expected: "an integer",
            })
    }

    /// Subtracts `delta` from an integer value, stopping at zero.
    pub fn decrement(&mut self, key: &str, delta: i64) -> Result<i64> {
        self.live_item_or_miss(key)?
            .value
            .saturating_decrement(delta)
            .ok_or_else(|| CacheError::WrongType {
                key: key.to_string(),
                expected: "an integer",
            })
    }

    /// Adds `delta` to an `f32` or `f64` value.
    pub fn increment_float(&mut self, key: &str, delta: f64) -> Result<f64> {
        self.live_item_or_miss(key)?
            .value
            .float_increment(delta)
            .ok_or_else(|| CacheError::WrongType {
                key: key.to_string(),
                expected: "a float32 or float64",
            })
    }

    // == Delete Expired ==
    /// Removes all expired items, returning how many were removed.
    pub fn delete_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.items.len();
        self.items.retain(|_, item| !item.is_expired_at(now));
        let removed = before - self.items.len();
        self.stats.record_expirations(removed);
        removed
    }

    // == Flush ==
    /// Discards every item.
    pub fn flush(&mut self) {
        self.items = HashMap::new();
    }

    // == Persistence ==
    pub fn items(&self) -> &HashMap<String, Item> {
        &self.items
    }

    /// Inserts incoming items whose keys are not live here. Existing live
    /// items win; incoming items that already expired are dropped.
    ///
    /// Returns the number of items inserted.
    pub fn merge(&mut self, incoming: HashMap<String, Item>) -> usize {
        let now = Utc::now();
        let mut inserted = 0;
        for (key, item) in incoming {
            if item.is_expired_at(now) {
                continue;
            }
            if matches!(self.items.get(&key), Some(existing) if !existing.is_expired_at(now)) {
                continue;
            }
            self.items.insert(key, item);
            inserted += 1;
        }
        inserted
    }

    pub fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        snapshot::encode(writer, &self.items)
    }

    pub fn load<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<usize> {
        let incoming = snapshot::decode(reader)?;
        Ok(self.merge(incoming))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.items.len());
        stats
    }

    /// Number of stored items, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
