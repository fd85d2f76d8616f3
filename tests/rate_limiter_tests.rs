use std::sync::Arc;

use snaplink::config::RateLimitConfig;
use snaplink::faststore::MemoryFastStore;
use snaplink::services::RateLimiter;

fn limiter(fast: Arc<MemoryFastStore>, max_requests: u64, window_seconds: u64) -> RateLimiter {
    RateLimiter::new(
        fast,
        &RateLimitConfig {
            max_requests,
            window_seconds,
        },
    )
}

#[cfg(test)]
mod window_tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_exactly_max_requests() {
        let fast = Arc::new(MemoryFastStore::new());
        let limiter = limiter(fast, 3, 60);

        for _ in 0..3 {
            assert!(limiter.allow("203.0.113.7").await);
        }
        // the (max + 1)-th request in the same window is rejected
        assert!(!limiter.allow("203.0.113.7").await);
    }

    #[tokio::test]
    async fn test_window_elapse_resets_the_count() {
        let fast = Arc::new(MemoryFastStore::new());
        let limiter = limiter(fast, 2, 1);

        assert!(limiter.allow("203.0.113.8").await);
        assert!(limiter.allow("203.0.113.8").await);
        assert!(!limiter.allow("203.0.113.8").await);

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert!(limiter.allow("203.0.113.8").await);
    }

    #[tokio::test]
    async fn test_clients_have_independent_windows() {
        let fast = Arc::new(MemoryFastStore::new());
        let limiter = limiter(fast, 1, 60);

        assert!(limiter.allow("client-a").await);
        assert!(!limiter.allow("client-a").await);
        assert!(limiter.allow("client-b").await);
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_fails_open_when_store_is_down() {
        let fast = Arc::new(MemoryFastStore::new());
        let limiter = limiter(fast.clone(), 1, 60);

        assert!(limiter.allow("203.0.113.9").await);
        assert!(!limiter.allow("203.0.113.9").await);

        // availability over enforcement while the store is unreachable
        fast.set_unavailable(true);
        assert!(limiter.allow("203.0.113.9").await);
    }

    #[tokio::test]
    async fn test_enforcement_resumes_after_recovery() {
        let fast = Arc::new(MemoryFastStore::new());
        let limiter = limiter(fast.clone(), 1, 60);

        assert!(limiter.allow("203.0.113.10").await);

        fast.set_unavailable(true);
        assert!(limiter.allow("203.0.113.10").await);

        fast.set_unavailable(false);
        // window state survived the outage
        assert!(!limiter.allow("203.0.113.10").await);
    }
}
