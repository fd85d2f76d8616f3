//! Fast-store seam
//!
//! All hot-path coordination lives behind this trait: plain key primitives
//! plus the two atomic multi-step bundles (`touch`, `rate_incr`) that the
//! redis backend runs as server-side scripts. No application-level lock
//! guards click tracking, rate limiting, or the dirty-set swap.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::FastStoreConfig;
use crate::errors::{Result, SnaplinkError};

pub mod memory;
pub mod redis;

pub use self::memory::MemoryFastStore;
pub use self::redis::RedisFastStore;

/// Fast-store key schema. Every key the subsystem writes is minted here.
pub mod keys {
    /// Set of codes touched since the last sync swap
    pub const DIRTY_SET: &str = "dirty_urls";
    /// Rename target while a sync cycle is draining the batch
    pub const DIRTY_PROCESSING: &str = "dirty_urls:processing";

    pub fn clicks(code: &str) -> String {
        format!("url:{code}:clicks")
    }

    pub fn expiry(code: &str) -> String {
        format!("url:{code}:expiry")
    }

    pub fn rate_limit(client_id: &str) -> String {
        format!("rate_limit:{client_id}")
    }
}

/// Result of the atomic hot-path operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// Stored expiry is past; nothing was mutated
    Expired,
    /// Click count after the increment
    Clicks(u64),
}

#[async_trait]
pub trait FastStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;
    async fn set_add(&self, key: &str, member: &str) -> Result<()>;
    async fn set_members(&self, key: &str) -> Result<Vec<String>>;

    /// Atomic rename; `Ok(false)` means the source key did not exist,
    /// which the sync cycle treats as "nothing to sync"
    async fn rename(&self, src: &str, dst: &str) -> Result<bool>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// The hot-path bundle: seed missing click/expiry keys from the
    /// durable fallbacks, compare stored expiry to `now`, increment, mark
    /// dirty. One indivisible step; `now` and `fallback_expiry` must be in
    /// the canonical timestamp format.
    async fn touch(
        &self,
        code: &str,
        fallback_clicks: u64,
        fallback_expiry: &str,
        now: &str,
    ) -> Result<TouchOutcome>;

    /// Atomic increment + expire-on-first-hit for a rate window; returns
    /// the post-increment count
    async fn rate_incr(&self, key: &str, window_seconds: u64) -> Result<u64>;
}

pub struct FastStoreFactory;

impl FastStoreFactory {
    pub fn create(config: &FastStoreConfig) -> Result<Arc<dyn FastStore>> {
        let boxed: Box<dyn FastStore> = match config.backend.as_str() {
            "memory" => Box::new(MemoryFastStore::new()),
            "redis" => Box::new(RedisFastStore::new(config)?),
            other => {
                return Err(SnaplinkError::configuration(format!(
                    "Unknown fast-store backend: '{other}'"
                )));
            }
        };

        Ok(Arc::from(boxed))
    }
}
