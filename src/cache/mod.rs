//! Cache Module
//!
//! In-memory caching with TTL expiration, optional sharding and a background
//! janitor.

mod backend;
mod entry;
mod memory;
mod shard;
mod sharded;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::{KeyValueCache, StreamEntry};
pub use entry::{Expiration, Item};
pub use memory::MemoryCache;
pub use shard::Shard;
pub use sharded::{bucket_for, ShardedCache};
pub use stats::CacheStats;
pub use store::CacheStore;
