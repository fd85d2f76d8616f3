use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use crate::cache::ObjectCache;
use crate::config::CacheConfig;
use crate::storage::UrlMapping;

/// Entry TTL capped at the mapping's own expiry, so a cache entry can
/// never outlive the link it describes
struct MappingExpiry {
    default_ttl: Duration,
}

impl Expiry<String, UrlMapping> for MappingExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &UrlMapping,
        _created_at: Instant,
    ) -> Option<Duration> {
        let now = chrono::Utc::now();
        if value.expires_at <= now {
            Some(Duration::from_secs(1))
        } else {
            let remaining = (value.expires_at - now).num_seconds().max(1) as u64;
            Some(Duration::from_secs(remaining.min(self.default_ttl.as_secs())))
        }
    }
}

pub struct MokaObjectCache {
    inner: Cache<String, UrlMapping>,
}

impl MokaObjectCache {
    pub fn new(config: &CacheConfig) -> Self {
        let default_ttl = Duration::from_secs(config.default_ttl);

        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(MappingExpiry { default_ttl })
            .build();

        debug!(
            "MokaObjectCache initialized with max capacity: {}, default TTL: {}s",
            config.max_capacity, config.default_ttl
        );
        Self { inner }
    }
}

#[async_trait]
impl ObjectCache for MokaObjectCache {
    async fn get(&self, key: &str) -> Option<UrlMapping> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: &str, value: UrlMapping) {
        self.inner.insert(key.to_string(), value).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}
