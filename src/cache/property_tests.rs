//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify the store's correctness properties.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, CacheStore, MockClock};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);
const TEST_EPOCH_MS: u64 = 1_700_000_000_000;

fn test_store(max_size: usize) -> (CacheStore<String>, MockClock) {
    let clock = MockClock::at(TEST_EPOCH_MS);
    let store = CacheStore::new(max_size, TEST_DEFAULT_TTL).with_clock(Arc::new(clock.clone()));
    (store, clock)
}

// == Strategies ==
/// Generates valid cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates cache values
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}".prop_map(|s| s)
}

/// Generates a small key space so sequences revisit keys
fn narrow_key_strategy() -> impl Strategy<Value = String> {
    "[a-e]".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Has { key: String },
    Delete { key: String },
    Advance { millis: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (narrow_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        narrow_key_strategy().prop_map(|key| CacheOp::Get { key }),
        narrow_key_strategy().prop_map(|key| CacheOp::Has { key }),
        narrow_key_strategy().prop_map(|key| CacheOp::Delete { key }),
        (0u64..200_000).prop_map(|millis| CacheOp::Advance { millis }),
    ]
}

fn unique(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, every get records exactly one hit or
    // one miss, and hits + misses equals total requests.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (mut store, clock) = test_store(3);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value, None),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Has { key } => {
                    store.has(&key);
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
                CacheOp::Advance { millis } => clock.advance_ms(millis),
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.hits + stats.misses, stats.total_requests);
        prop_assert_eq!(stats.size, store.len(), "Size mismatch");
        if stats.total_requests == 0 {
            prop_assert_eq!(stats.hit_rate, 0.0);
        } else {
            prop_assert!((stats.hit_rate - expected_hits as f64 / stats.total_requests as f64).abs() < 1e-12);
        }
    }

    // Storing a pair and reading it back before expiry returns the same value.
    #[test]
    fn prop_roundtrip_storage(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl_ms in 1u64..10_000_000
    ) {
        let (mut store, _clock) = test_store(TEST_MAX_ENTRIES);

        store.set(key.clone(), value.clone(), Some(Duration::from_millis(ttl_ms)));

        prop_assert_eq!(store.get(&key), Some(value), "Round-trip value mismatch");
    }

    // After DELETE, GET reports a miss.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let (mut store, _clock) = test_store(TEST_MAX_ENTRIES);

        store.set(key.clone(), value, None);
        prop_assert!(store.get(&key).is_some(), "Key should exist before delete");

        prop_assert!(store.delete(&key));
        prop_assert!(store.get(&key).is_none(), "Key should not exist after delete");
        prop_assert!(!store.delete(&key));
    }

    // Writing V1 then V2 under one key leaves V2 and a single entry.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let (mut store, _clock) = test_store(TEST_MAX_ENTRIES);

        store.set(key.clone(), value1, None);
        store.set(key.clone(), value2.clone(), None);

        prop_assert_eq!(store.get(&key), Some(value2), "Overwrite should return new value");
        prop_assert_eq!(store.len(), 1, "Should have exactly one entry after overwrite");
    }

    // The number of entries never exceeds the configured capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let max_size = 50;
        let (mut store, _clock) = test_store(max_size);

        for (key, value) in entries {
            store.set(key, value, None);
            prop_assert!(
                store.len() <= max_size,
                "Cache size {} exceeds max {}",
                store.len(),
                max_size
            );
        }
    }

    // An entry is readable up to its TTL and never after it.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl_ms in 1u64..1_000_000,
        late_by in 1u64..1_000_000
    ) {
        let (mut store, clock) = test_store(TEST_MAX_ENTRIES);

        store.set(key.clone(), value.clone(), Some(Duration::from_millis(ttl_ms)));

        clock.advance_ms(ttl_ms);
        prop_assert_eq!(store.get(&key), Some(value), "Entry should be live at its TTL");

        clock.advance_ms(late_by);
        prop_assert!(store.get(&key).is_none(), "Entry should not be found after TTL expires");
        prop_assert_eq!(store.len(), 0);
    }

    // has() and get() agree on liveness at every instant.
    #[test]
    fn prop_has_agrees_with_get(
        key in valid_key_strategy(),
        ttl_ms in 1u64..10_000,
        elapsed in 0u64..20_000
    ) {
        let (mut store, clock) = test_store(TEST_MAX_ENTRIES);
        store.set(key.clone(), "v".to_string(), Some(Duration::from_millis(ttl_ms)));
        clock.advance_ms(elapsed);

        let exists = store.has(&key);
        prop_assert_eq!(exists, store.get(&key).is_some());
    }

    // Keys under an invalidated tag disappear; keys under other tags stay.
    #[test]
    fn prop_tag_invalidation_isolated(
        tagged in prop::collection::vec(valid_key_strategy(), 1..10),
        others in prop::collection::vec(valid_key_strategy(), 1..10)
    ) {
        let tagged = unique(tagged);
        let others: Vec<String> = unique(others)
            .into_iter()
            .filter(|k| !tagged.contains(k))
            .collect();
        let (mut store, _clock) = test_store(TEST_MAX_ENTRIES);

        for key in &tagged {
            store.set_with_tags(key.clone(), key.clone(), ["target"], None);
        }
        for key in &others {
            store.set_with_tags(key.clone(), key.clone(), ["bystander"], None);
        }

        prop_assert_eq!(store.invalidate_by_tag("target"), tagged.len());

        for key in &tagged {
            prop_assert!(!store.has(key));
        }
        for key in &others {
            prop_assert_eq!(store.get(key), Some(key.clone()));
        }
    }
}

// Property tests for LRU eviction behavior
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Filling to capacity and adding one more key evicts the first key written.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(valid_key_strategy(), 3..10),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys = unique(initial_keys);
        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let (mut store, _clock) = test_store(capacity);

        let oldest_key = unique_keys[0].clone();
        for key in &unique_keys {
            store.set(key.clone(), format!("value_{}", key), None);
        }
        prop_assert_eq!(store.len(), capacity, "Cache should be at capacity");

        store.set(new_key.clone(), new_value, None);

        prop_assert_eq!(store.len(), capacity, "Cache should remain at capacity after eviction");
        prop_assert_eq!(store.stats().evictions, 1);
        prop_assert!(
            store.get(&oldest_key).is_none(),
            "Oldest key '{}' should have been evicted",
            oldest_key
        );
        prop_assert!(store.get(&new_key).is_some(), "New key should exist");
        for key in unique_keys.iter().skip(1) {
            prop_assert!(store.get(key).is_some(), "Key '{}' should still exist", key);
        }
    }

    // A GET hit makes the key most recently used, so it is not the next victim.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::vec(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys = unique(keys);
        prop_assume!(unique_keys.len() >= 3);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let (mut store, clock) = test_store(capacity);

        for key in &unique_keys {
            store.set(key.clone(), format!("value_{}", key), None);
            clock.advance_ms(1);
        }

        let accessed_key = unique_keys[0].clone();
        prop_assert!(store.get(&accessed_key).is_some());
        let expected_evicted = unique_keys[1].clone();

        store.set(new_key.clone(), new_value, None);

        prop_assert!(
            store.get(&accessed_key).is_some(),
            "Accessed key '{}' should not be evicted after being touched",
            accessed_key
        );
        prop_assert!(
            store.get(&expected_evicted).is_none(),
            "Key '{}' should have been evicted as it was oldest after access",
            expected_evicted
        );
        prop_assert!(store.get(&new_key).is_some(), "New key should exist");
    }
}

// == Property Test for Concurrent Operation Correctness ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Concurrent writers and readers on one handle keep the store within
    // capacity and the counters consistent with the reads performed.
    #[test]
    fn prop_concurrent_operation_correctness(
        operations in prop::collection::vec(cache_op_strategy(), 10..50)
    ) {
        let clock = MockClock::at(TEST_EPOCH_MS);
        let cache: Cache<String> = Cache::new(
            CacheStore::new(3, TEST_DEFAULT_TTL).with_clock(Arc::new(clock)),
        );

        let handles: Vec<_> = operations
            .into_iter()
            .map(|op| {
                let cache = cache.clone();
                std::thread::spawn(move || match op {
                    CacheOp::Set { key, value } => {
                        cache.set(key, value, None);
                        0
                    }
                    CacheOp::Get { key } => {
                        cache.get(&key);
                        1
                    }
                    CacheOp::Has { key } => {
                        cache.has(&key);
                        0
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(&key);
                        0
                    }
                    CacheOp::Advance { .. } => 0,
                })
            })
            .collect();

        let mut gets = 0u64;
        for handle in handles {
            gets += handle.join().expect("worker should not panic");
        }

        let stats = cache.stats();
        prop_assert!(stats.size <= 3, "Cache should not exceed max entries");
        prop_assert_eq!(stats.total_requests, gets);
        prop_assert!(stats.hit_rate >= 0.0 && stats.hit_rate <= 1.0);
    }
}
