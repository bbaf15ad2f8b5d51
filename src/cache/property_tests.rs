//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check routing, storage, arithmetic and persistence
//! properties of the in-memory caches.

use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::cache::{bucket_for, CacheStore, Expiration, KeyValueCache, MemoryCache, ShardedCache};
use crate::config::CacheConfig;
use crate::models::Value;

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:-]{1,48}"
}

/// Generates encodable values, including nested lists and maps
fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i8>().prop_map(Value::I8),
        any::<i64>().prop_map(Value::I64),
        any::<u16>().prop_map(Value::U16),
        any::<u64>().prop_map(Value::U64),
        (-1.0e6f64..1.0e6).prop_map(Value::F64),
        "[ -~]{0,32}".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m: BTreeMap<String, Value>| Value::Map(m)),
        ]
    })
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: i64 },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<i64>()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn memory() -> MemoryCache {
    MemoryCache::new(CacheConfig::default()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Routing is a pure function of key and shard count
    #[test]
    fn prop_bucket_is_deterministic(key in key_strategy(), shards in 1usize..64) {
        let first = bucket_for(&key, shards);
        prop_assert!(first < shards);
        prop_assert_eq!(bucket_for(&key, shards), first);
    }

    // Each stored key is visible through exactly one shard
    #[test]
    fn prop_shards_are_disjoint(
        keys in prop::collection::hash_set(key_strategy(), 1..40),
        shards in 1usize..16
    ) {
        let cache = ShardedCache::new(CacheConfig::new().with_shard_count(shards)).unwrap();
        for key in &keys {
            cache.set(key, Value::from(key.as_str()), Expiration::Default);
        }

        let mut seen = HashSet::new();
        for key in &keys {
            prop_assert_eq!(cache.get(key), Some(Value::from(key.as_str())));
            prop_assert!(seen.insert((cache.bucket(key), key.clone())));
        }
        prop_assert_eq!(cache.len(), keys.len());
    }

    // Storing then reading before expiration returns the same value
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let cache = memory();
        cache.set(&key, value.clone(), Expiration::Default);
        prop_assert_eq!(cache.get(&key), Some(value));
    }

    // A later set replaces an earlier one
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        first in value_strategy(),
        second in value_strategy()
    ) {
        let cache = memory();
        cache.set(&key, first, Expiration::Default);
        cache.set(&key, second.clone(), Expiration::Never);

        prop_assert_eq!(cache.get(&key), Some(second));
        prop_assert_eq!(cache.len(), 1);
    }

    // The store agrees with a plain map for any sequence of operations
    #[test]
    fn prop_operations_match_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut store = CacheStore::new(None);
        let mut model = std::collections::HashMap::new();
        let mut hits = 0u64;
        let mut misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(&key, Value::I64(value), Expiration::Default);
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let expected = model.get(&key).copied().map(Value::I64);
                    if expected.is_some() { hits += 1 } else { misses += 1 }
                    prop_assert_eq!(store.get(&key), expected);
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&key).is_ok(), model.remove(&key).is_some());
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, hits);
        prop_assert_eq!(stats.misses, misses);
        prop_assert_eq!(stats.total_entries, model.len());
    }

    // Increment wraps like the stored width's native addition
    #[test]
    fn prop_increment_wraps_at_width(start in any::<i8>(), delta in any::<i64>()) {
        let cache = memory();
        cache.set("k", Value::I8(start), Expiration::Default);

        let expected = start.wrapping_add(delta as i8);
        prop_assert_eq!(cache.increment("k", delta).unwrap(), i64::from(expected));
        prop_assert_eq!(cache.get("k"), Some(Value::I8(expected)));
    }

    // Decrement never wraps below zero on unsigned values
    #[test]
    fn prop_decrement_saturates(start in any::<u32>(), delta in 0i64..=i64::from(u32::MAX)) {
        let cache = memory();
        cache.set("k", Value::U32(start), Expiration::Default);

        let expected = start.saturating_sub(delta as u32);
        prop_assert_eq!(cache.decrement("k", delta).unwrap(), i64::from(expected));
    }

    // Decrement stays within 0..=MAX for any delta, including negative ones
    #[test]
    fn prop_decrement_stays_in_range(start in any::<i8>(), delta in any::<i64>()) {
        let cache = memory();
        cache.set("k", Value::I8(start), Expiration::Default);

        let expected = (i128::from(start) - i128::from(delta)).clamp(0, 127) as i64;
        prop_assert_eq!(cache.decrement("k", delta).unwrap(), expected);
    }

    // Save then load into an empty cache reproduces every entry
    #[test]
    fn prop_save_load_reproduces_entries(
        entries in prop::collection::hash_map(key_strategy(), value_strategy(), 0..20)
    ) {
        let source = memory();
        for (key, value) in &entries {
            source.set(key, value.clone(), Expiration::Never);
        }
        let mut buf = Vec::new();
        source.save(&mut buf).unwrap();

        let target = memory();
        prop_assert_eq!(target.load(&mut buf.as_slice()).unwrap(), entries.len());
        for (key, value) in &entries {
            prop_assert_eq!(target.get(key), Some(value.clone()));
        }
    }

    // Loading never replaces a live entry already in the destination
    #[test]
    fn prop_load_is_additive(
        key in key_strategy(),
        theirs in value_strategy(),
        mine in value_strategy()
    ) {
        let source = memory();
        source.set(&key, theirs, Expiration::Default);
        source.set("only-in-source", Value::Bool(true), Expiration::Default);
        let mut buf = Vec::new();
        source.save(&mut buf).unwrap();

        let target = memory();
        target.set(&key, mine.clone(), Expiration::Default);
        target.load(&mut buf.as_slice()).unwrap();

        prop_assert_eq!(target.get(&key), Some(mine));
        if key != "only-in-source" {
            prop_assert_eq!(target.get("only-in-source"), Some(Value::Bool(true)));
        }
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // Default expiration substitutes for Expiration::Default
    #[test]
    fn prop_default_expiration_substitution(key in key_strategy(), value in value_strategy()) {
        let config = CacheConfig::new().with_default_expiration(Duration::from_millis(20));
        let cache = MemoryCache::new(config).unwrap();
        prop_assume!(key != "forever");

        cache.set(&key, value.clone(), Expiration::Default);
        cache.set("explicit", value.clone(), Expiration::After(Duration::from_millis(20)));
        cache.set("forever", value.clone(), Expiration::Never);
        prop_assert_eq!(cache.get(&key), Some(value.clone()));

        std::thread::sleep(Duration::from_millis(40));

        prop_assert_eq!(cache.get(&key), None);
        prop_assert_eq!(cache.get("explicit"), None);
        prop_assert_eq!(cache.get("forever"), Some(value));
    }
}
