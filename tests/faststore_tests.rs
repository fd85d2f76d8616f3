use chrono::{Duration, Utc};

use snaplink::faststore::{FastStore, MemoryFastStore, TouchOutcome, keys};
use snaplink::utils::format_ts;

fn future_ts(days: i64) -> String {
    format_ts(Utc::now() + Duration::days(days))
}

fn past_ts(days: i64) -> String {
    format_ts(Utc::now() - Duration::days(days))
}

fn now_ts() -> String {
    format_ts(Utc::now())
}

#[cfg(test)]
mod touch_tests {
    use super::*;

    #[tokio::test]
    async fn test_touch_seeds_from_fallbacks() {
        let fast = MemoryFastStore::new();
        let fallback_expiry = future_ts(30);

        let outcome = fast
            .touch("abc", 41, &fallback_expiry, &now_ts())
            .await
            .unwrap();

        // fallback 41 seeded, then incremented
        assert_eq!(outcome, TouchOutcome::Clicks(42));
        assert_eq!(
            fast.get(&keys::clicks("abc")).await.unwrap(),
            Some("42".to_string())
        );
        assert_eq!(
            fast.get(&keys::expiry("abc")).await.unwrap(),
            Some(fallback_expiry)
        );
    }

    #[tokio::test]
    async fn test_touch_prefers_stored_state_over_fallbacks() {
        let fast = MemoryFastStore::new();
        fast.set_ex(&keys::clicks("abc"), "7", 3600).await.unwrap();
        fast.set_ex(&keys::expiry("abc"), &future_ts(30), 3600)
            .await
            .unwrap();

        // stale durable fallbacks must not overwrite live hot state
        let outcome = fast.touch("abc", 0, &future_ts(1), &now_ts()).await.unwrap();
        assert_eq!(outcome, TouchOutcome::Clicks(8));
    }

    #[tokio::test]
    async fn test_touch_expired_returns_sentinel_without_increment() {
        let fast = MemoryFastStore::new();
        fast.set_ex(&keys::clicks("old"), "5", 3600).await.unwrap();
        fast.set_ex(&keys::expiry("old"), &past_ts(1), 3600)
            .await
            .unwrap();

        let outcome = fast.touch("old", 5, &past_ts(1), &now_ts()).await.unwrap();

        assert_eq!(outcome, TouchOutcome::Expired);
        // no mutation after the expiry check fails
        assert_eq!(
            fast.get(&keys::clicks("old")).await.unwrap(),
            Some("5".to_string())
        );
        assert!(
            fast.set_members(keys::DIRTY_SET)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_dirty_set_holds_codes_not_touch_counts() {
        let fast = MemoryFastStore::new();

        for _ in 0..5 {
            fast.touch("aaa", 0, &future_ts(30), &now_ts()).await.unwrap();
        }
        for _ in 0..3 {
            fast.touch("bbb", 0, &future_ts(30), &now_ts()).await.unwrap();
        }

        let mut dirty = fast.set_members(keys::DIRTY_SET).await.unwrap();
        dirty.sort();
        assert_eq!(dirty, vec!["aaa".to_string(), "bbb".to_string()]);
    }

    #[tokio::test]
    async fn test_touch_after_rename_recreates_active_set() {
        let fast = MemoryFastStore::new();
        fast.touch("one", 0, &future_ts(30), &now_ts()).await.unwrap();

        assert!(
            fast.rename(keys::DIRTY_SET, keys::DIRTY_PROCESSING)
                .await
                .unwrap()
        );

        // a touch concurrent with the swap lands in a fresh active set
        fast.touch("two", 0, &future_ts(30), &now_ts()).await.unwrap();

        assert_eq!(
            fast.set_members(keys::DIRTY_SET).await.unwrap(),
            vec!["two".to_string()]
        );
        assert_eq!(
            fast.set_members(keys::DIRTY_PROCESSING).await.unwrap(),
            vec!["one".to_string()]
        );
    }
}

#[cfg(test)]
mod primitive_tests {
    use super::*;

    #[tokio::test]
    async fn test_rename_missing_source_reports_false() {
        let fast = MemoryFastStore::new();
        assert!(
            !fast
                .rename(keys::DIRTY_SET, keys::DIRTY_PROCESSING)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_set_ex_expires() {
        let fast = MemoryFastStore::new();
        fast.set_ex("k", "v", 1).await.unwrap();
        assert_eq!(fast.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert_eq!(fast.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_removes_strings_and_sets() {
        let fast = MemoryFastStore::new();
        fast.set_ex("k", "v", 60).await.unwrap();
        fast.set_add("s", "m").await.unwrap();

        fast.delete("k").await.unwrap();
        fast.delete("s").await.unwrap();

        assert_eq!(fast.get("k").await.unwrap(), None);
        assert!(fast.set_members("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let fast = MemoryFastStore::new();
        fast.set_unavailable(true);

        let err = fast.get("k").await.unwrap_err();
        assert!(err.is_transient());

        let err = fast
            .touch("abc", 0, &future_ts(30), &now_ts())
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}

#[cfg(test)]
mod rate_incr_tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_within_window() {
        let fast = MemoryFastStore::new();
        let key = keys::rate_limit("10.0.0.1");

        assert_eq!(fast.rate_incr(&key, 60).await.unwrap(), 1);
        assert_eq!(fast.rate_incr(&key, 60).await.unwrap(), 2);
        assert_eq!(fast.rate_incr(&key, 60).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_count() {
        let fast = MemoryFastStore::new();
        let key = keys::rate_limit("10.0.0.2");

        assert_eq!(fast.rate_incr(&key, 1).await.unwrap(), 1);
        assert_eq!(fast.rate_incr(&key, 1).await.unwrap(), 2);

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert_eq!(fast.rate_incr(&key, 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clients_are_isolated() {
        let fast = MemoryFastStore::new();

        fast.rate_incr(&keys::rate_limit("a"), 60).await.unwrap();
        let b = fast.rate_incr(&keys::rate_limit("b"), 60).await.unwrap();
        assert_eq!(b, 1);
    }
}
