//! Shard Module
//!
//! A [`CacheStore`] behind a single mutex. Every operation, including sweeps and
//! snapshot passes, holds the lock for its whole duration.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{CacheStats, CacheStore, Expiration, Item};
use crate::error::Result;
use crate::models::Value;
use crate::tasks::Sweep;

// == Shard ==
/// One independently locked key space.
#[derive(Debug, Default)]
pub struct Shard {
    store: Mutex<CacheStore>,
}

impl Shard {
    pub fn new(default_expiration: Option<Duration>) -> Self {
        Self {
            store: Mutex::new(CacheStore::new(default_expiration)),
        }
    }

    pub fn default_expiration(&self) -> Option<Duration> {
        self.store.lock().default_expiration()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.lock().get(key)
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.store.lock().get_string(key)
    }

    pub fn set(&self, key: &str, value: Value, expiration: Expiration) {
        self.store.lock().set(key, value, expiration);
    }

    pub fn exists(&self, key: &str) -> bool {
        self.store.lock().exists(key)
    }

    pub fn delete(&self, key: &str) -> Result<u64> {
        self.store.lock().delete(key)
    }

    pub fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        self.store.lock().increment(key, delta)
    }

    pub fn decrement(&self, key: &str, delta: i64) -> Result<i64> {
        self.store.lock().decrement(key, delta)
    }

    pub fn increment_float(&self, key: &str, delta: f64) -> Result<f64> {
        self.store.lock().increment_float(key, delta)
    }

    pub fn delete_expired(&self) -> usize {
        self.store.lock().delete_expired()
    }

    pub fn flush(&self) {
        self.store.lock().flush();
    }

    /// Encodes the whole shard while holding its lock.
    pub fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        self.store.lock().save(writer)
    }

    /// Decodes and merges a snapshot while holding the lock.
    pub fn load<R: Read + ?Sized>(&self, reader: &mut R) -> Result<usize> {
        self.store.lock().load(reader)
    }

    /// Copies every item into `out`.
    pub fn collect_into(&self, out: &mut HashMap<String, Item>) {
        let store = self.store.lock();
        out.extend(
            store
                .items()
                .iter()
                .map(|(key, item)| (key.clone(), item.clone())),
        );
    }

    pub fn merge(&self, incoming: HashMap<String, Item>) -> usize {
        self.store.lock().merge(incoming)
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }
}

impl Sweep for Shard {
    fn sweep(&self) -> usize {
        self.delete_expired()
    }
}
