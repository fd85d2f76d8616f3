use std::sync::Arc;

use chrono::Utc;

use snaplink::cache::{MokaObjectCache, ObjectCache, ReadThroughCache};
use snaplink::config::CacheConfig;
use snaplink::storage::{LinkStore, MemoryStore, UrlMapping};

fn mapping(code: &str, url: &str) -> UrlMapping {
    let now = Utc::now();
    UrlMapping {
        short_code: code.to_string(),
        original_url: url.to_string(),
        created_at: now,
        expires_at: now + chrono::Duration::days(30),
        click_count: 0,
    }
}

fn read_through(store: Arc<MemoryStore>) -> ReadThroughCache {
    let config = CacheConfig {
        max_capacity: 100,
        default_ttl: 3600,
    };
    ReadThroughCache::new(
        Arc::new(MokaObjectCache::new(&config)),
        Arc::new(MokaObjectCache::new(&config)),
        store,
    )
}

#[cfg(test)]
mod cache_aside_tests {
    use super::*;

    #[tokio::test]
    async fn test_miss_falls_back_to_store() {
        let store = Arc::new(MemoryStore::new());
        store.insert(&mapping("abc", "https://a.example")).await.unwrap();
        let cache = read_through(store);

        let found = cache.get_by_code("abc").await.unwrap().unwrap();
        assert_eq!(found.original_url, "https://a.example");
    }

    #[tokio::test]
    async fn test_absence_is_never_cached() {
        let store = Arc::new(MemoryStore::new());
        let cache = read_through(store.clone());

        // lookup before the link exists
        assert!(cache.get_by_code("abc").await.unwrap().is_none());

        // created immediately afterwards: visible on the very next call
        store.insert(&mapping("abc", "https://a.example")).await.unwrap();
        assert!(cache.get_by_code("abc").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_lookup_by_url_deduplicates() {
        let store = Arc::new(MemoryStore::new());
        store.insert(&mapping("abc", "https://a.example")).await.unwrap();
        let cache = read_through(store);

        let found = cache.get_by_url("https://a.example").await.unwrap().unwrap();
        assert_eq!(found.short_code, "abc");
        assert!(cache.get_by_url("https://other.example").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_code_and_url_caches_are_independent() {
        let store = Arc::new(MemoryStore::new());
        store.insert(&mapping("abc", "https://a.example")).await.unwrap();
        let cache = read_through(store.clone());

        assert!(cache.get_by_code("abc").await.unwrap().is_some());
        assert!(cache.get_by_url("https://a.example").await.unwrap().is_some());
    }
}

#[cfg(test)]
mod object_cache_tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let cache = MokaObjectCache::new(&CacheConfig {
            max_capacity: 10,
            default_ttl: 3600,
        });

        cache.insert("abc", mapping("abc", "https://a.example")).await;
        assert!(cache.get("abc").await.is_some());

        cache.remove("abc").await;
        assert!(cache.get("abc").await.is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_key_is_none() {
        let cache = MokaObjectCache::new(&CacheConfig {
            max_capacity: 10,
            default_ttl: 3600,
        });
        assert!(cache.get("nope").await.is_none());
    }
}
