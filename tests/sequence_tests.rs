use std::collections::HashSet;
use std::sync::Arc;

use snaplink::errors::SnaplinkError;
use snaplink::services::SequenceAllocator;
use snaplink::storage::{LinkStore, MemoryStore};

const COUNTER: &str = "url_sequence";

async fn fresh_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.ensure_counter(COUNTER).await.unwrap();
    store
}

#[cfg(test)]
mod uniqueness_tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_ids_are_unique() {
        let store = fresh_store().await;
        let allocator = SequenceAllocator::new(store.clone(), 100);

        let mut seen = HashSet::new();
        for _ in 0..250 {
            let id = allocator.next_id(COUNTER).await.unwrap();
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }

    #[tokio::test]
    async fn test_concurrent_ids_are_unique() {
        let store = fresh_store().await;
        let allocator = Arc::new(SequenceAllocator::new(store.clone(), 100));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                let mut ids = Vec::with_capacity(50);
                for _ in 0..50 {
                    ids.push(allocator.next_id(COUNTER).await.unwrap());
                }
                ids
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 400);
    }

    #[tokio::test]
    async fn test_independent_counters_do_not_interfere() {
        let store = fresh_store().await;
        store.ensure_counter("other_sequence").await.unwrap();
        let allocator = SequenceAllocator::new(store.clone(), 10);

        let a = allocator.next_id(COUNTER).await.unwrap();
        let b = allocator.next_id("other_sequence").await.unwrap();
        // both counters start fresh, so both hand out their range's first id
        assert_eq!(a, b);
    }
}

#[cfg(test)]
mod range_refill_tests {
    use super::*;

    #[tokio::test]
    async fn test_one_round_trip_serves_full_range() {
        let store = fresh_store().await;
        let allocator = SequenceAllocator::new(store.clone(), 100);

        for _ in 0..100 {
            allocator.next_id(COUNTER).await.unwrap();
        }
        assert_eq!(store.allocation_round_trips(), 1);

        // the 101st id exhausts the window and triggers exactly one more
        allocator.next_id(COUNTER).await.unwrap();
        assert_eq!(store.allocation_round_trips(), 2);
    }

    #[tokio::test]
    async fn test_crash_skips_unconsumed_range() {
        let store = fresh_store().await;

        {
            let allocator = SequenceAllocator::new(store.clone(), 100);
            // consume 3 ids, then "crash" by dropping the allocator
            for _ in 0..3 {
                allocator.next_id(COUNTER).await.unwrap();
            }
        }

        // a restarted process gets a fresh range past the abandoned one
        let allocator = SequenceAllocator::new(store.clone(), 100);
        let id = allocator.next_id(COUNTER).await.unwrap();
        assert_eq!(id, 100);
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_refill_failure_propagates_as_allocation_error() {
        let store = fresh_store().await;
        store.set_allocation_failure(true);
        let allocator = SequenceAllocator::new(store.clone(), 100);

        let err = allocator.next_id(COUNTER).await.unwrap_err();
        assert!(matches!(err, SnaplinkError::Allocation(_)));
    }

    #[tokio::test]
    async fn test_recovery_after_refill_failure() {
        let store = fresh_store().await;
        store.set_allocation_failure(true);
        let allocator = SequenceAllocator::new(store.clone(), 100);

        assert!(allocator.next_id(COUNTER).await.is_err());

        store.set_allocation_failure(false);
        let id = allocator.next_id(COUNTER).await.unwrap();
        assert_eq!(id, 0);
    }

    #[tokio::test]
    async fn test_missing_counter_is_allocation_error() {
        let store = Arc::new(MemoryStore::new());
        let allocator = SequenceAllocator::new(store, 100);

        let err = allocator.next_id("never_bootstrapped").await.unwrap_err();
        assert!(matches!(err, SnaplinkError::Allocation(_)));
    }
}
