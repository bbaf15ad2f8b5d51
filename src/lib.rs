//! Mini TTL Cache - An in-memory key-value cache
//!
//! Provides a single-shard and a sharded cache with TTL expiration, lazy and
//! background (janitor) eviction of expired items, numeric counters and
//! snapshot persistence.

pub mod cache;
pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod tasks;

pub use cache::{CacheStats, Expiration, KeyValueCache, MemoryCache, ShardedCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use models::Value;
