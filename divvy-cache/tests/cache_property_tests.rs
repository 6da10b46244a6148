//! Property-Based Tests for the Resource Cache
//!
//! **Property 1: Capacity bound.** After every settled load the cache holds
//! at most its capacity, and its recency order tracks exactly the cached keys.
//!
//! **Property 2: LRU victim.** The cached key set always equals that of a
//! reference LRU model fed the same sequence of loads.
//!
//! **Property 3: Coalescing.** Any number of concurrent loads of one key
//! issue exactly one transport call and resolve to equal results.
//!
//! **Property 4: Validation.** Non-positive keys never reach the transport.

use divvy_cache::PageRequest;
use divvy_test_utils::assertions::assert_within_capacity;
use divvy_test_utils::fixtures::{cache_with, test_cache};
use divvy_test_utils::generators::{arb_invalid_key, arb_key_sequence, arb_resource_key};
use divvy_test_utils::MockTransport;
use futures_util::future::join_all;
use proptest::prelude::*;
use tokio::runtime::{Builder, Runtime};

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

/// Reference LRU: keys from least to most recently used.
fn model_lru(keys: &[i64], capacity: usize) -> Vec<i64> {
    let mut order: Vec<i64> = Vec::new();
    for key in keys {
        order.retain(|cached| cached != key);
        order.push(*key);
        if order.len() > capacity {
            order.remove(0);
        }
    }
    order
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// **Property 1 and 2: Capacity bound and LRU victim**
    #[test]
    fn prop_cached_keys_follow_lru_model(
        capacity in 1_usize..8,
        keys in arb_key_sequence(12, 40),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (cache, _, _) = test_cache(capacity);
            for key in &keys {
                cache.load(*key, PageRequest::first()).await.unwrap();
                assert_within_capacity(&cache);
            }

            let mut expected = model_lru(&keys, capacity);
            expected.sort_unstable();
            let cached: Vec<i64> = cache
                .cached_keys()
                .into_iter()
                .map(|key| key.get() as i64)
                .collect();
            prop_assert_eq!(cached, expected);
            Ok(())
        })?;
    }

    /// **Property 3: Coalescing**
    #[test]
    fn prop_concurrent_loads_coalesce(
        key in arb_resource_key(1_000),
        callers in 2_usize..12,
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (cache, transport, _) = cache_with(50, MockTransport::echo().gated());
            let handles: Vec<_> = (0..callers)
                .map(|_| cache.load(key, PageRequest::first()))
                .collect();

            transport.wait_for_waiting(1).await;
            transport.release(1);
            let results = join_all(handles).await;

            prop_assert_eq!(transport.calls_for(key), 1);
            prop_assert!(results.iter().all(|result| result == &results[0]));
            prop_assert_eq!(cache.stats().coalesced, callers as u64 - 1);
            Ok(())
        })?;
    }

    /// **Property 4: Validation**
    #[test]
    fn prop_invalid_keys_never_reach_transport(raw in arb_invalid_key()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (cache, transport, reporter) = test_cache(50);
            let failure = cache.load(raw, PageRequest::first()).await;

            prop_assert!(failure.is_err());
            prop_assert_eq!(transport.call_count(), 0);
            prop_assert_eq!(reporter.report_count(), 1);
            prop_assert!(cache.cached_keys().is_empty());
            Ok(())
        })?;
    }

    /// Views of keys that were never loaded read as virgin entries.
    #[test]
    fn prop_unloaded_keys_read_as_idle(
        loaded in arb_key_sequence(20, 10),
        queried in arb_resource_key(40),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (cache, _, _) = test_cache(50);
            for key in &loaded {
                cache.load(*key, PageRequest::first()).await.unwrap();
            }
            let queried_raw = queried.get() as i64;
            if !loaded.contains(&queried_raw) {
                prop_assert!(cache.is_idle(queried));
                prop_assert!(cache.items(queried).is_empty());
                prop_assert_eq!(cache.find_by_id(queried, queried_raw), None);
            } else {
                prop_assert!(cache.is_success(queried));
            }
            Ok(())
        })?;
    }
}
