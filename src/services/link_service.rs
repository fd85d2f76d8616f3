//! Link lifecycle service
//!
//! Shorten, resolve, and stats over the cache / fast-store / durable
//! seams. Resolve's hot path is one atomic fast-store bundle; when the
//! fast store is unreachable the durable copy answers and the click is
//! written through directly (degraded mode).

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};

use crate::cache::ReadThroughCache;
use crate::config::LinkConfig;
use crate::errors::{Result, SnaplinkError};
use crate::faststore::{FastStore, TouchOutcome, keys};
use crate::services::SequenceAllocator;
use crate::storage::{LinkStore, UrlMapping};
use crate::utils::{base62_encode, format_ts};

// ============ Response DTOs ============

/// Result of resolving a short code
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub target_url: String,
    /// Click count after this resolution
    pub clicks: u64,
}

/// Live statistics for a short code
#[derive(Debug, Clone)]
pub struct UrlStats {
    pub original_url: String,
    pub short_code: String,
    pub click_count: u64,
    pub created_at: String,
    pub expires_at: String,
}

pub struct LinkService {
    cache: Arc<ReadThroughCache>,
    store: Arc<dyn LinkStore>,
    fast: Arc<dyn FastStore>,
    allocator: Arc<SequenceAllocator>,
    counter_name: String,
    default_expiry_days: i64,
}

impl LinkService {
    pub fn new(
        cache: Arc<ReadThroughCache>,
        store: Arc<dyn LinkStore>,
        fast: Arc<dyn FastStore>,
        allocator: Arc<SequenceAllocator>,
        counter_name: String,
        config: &LinkConfig,
    ) -> Self {
        Self {
            cache,
            store,
            fast,
            allocator,
            counter_name,
            default_expiry_days: config.default_expiry_days,
        }
    }

    /// Shorten a URL, returning the existing code when this URL was
    /// already shortened. Allocation failure propagates: minting a
    /// possibly-duplicate id is never an acceptable fallback.
    #[instrument(skip(self), fields(url = %original_url))]
    pub async fn shorten_url(&self, original_url: &str) -> Result<String> {
        if original_url.is_empty() {
            return Err(SnaplinkError::validation("original url must not be empty"));
        }

        if let Some(existing) = self.cache.get_by_url(original_url).await? {
            return Ok(existing.short_code);
        }

        let id = self.allocator.next_id(&self.counter_name).await?;
        let short_code = base62_encode(id);

        let now = Utc::now();
        let expires_at = now + Duration::days(self.default_expiry_days);

        let mapping = UrlMapping {
            short_code: short_code.clone(),
            original_url: original_url.to_string(),
            created_at: now,
            expires_at,
            click_count: 0,
        };
        self.store.insert(&mapping).await?;

        // Warm the hot keys so the first redirect skips fallback seeding;
        // the keys die with the link. Best-effort: the touch bundle
        // reseeds them from the durable copy if this fails.
        let ttl = (expires_at - now).num_seconds().max(1) as u64;
        let seed = async {
            self.fast
                .set_ex(&keys::clicks(&short_code), "0", ttl)
                .await?;
            self.fast
                .set_ex(&keys::expiry(&short_code), &format_ts(expires_at), ttl)
                .await
        };
        if let Err(e) = seed.await {
            warn!("Hot-key seeding failed for '{}': {}", short_code, e);
        }

        info!("Shortened url to '{}'", short_code);
        Ok(short_code)
    }

    /// Resolve a code for a redirect: one atomic fast-store step
    /// validates expiry, counts the click, and marks the code dirty.
    #[instrument(skip(self))]
    pub async fn resolve(&self, code: &str) -> Result<ResolvedLink> {
        let mapping = self
            .cache
            .get_by_code(code)
            .await?
            .ok_or_else(|| SnaplinkError::not_found(format!("short code '{code}' not found")))?;

        let now = Utc::now();
        let outcome = self
            .fast
            .touch(
                code,
                mapping.click_count,
                &format_ts(mapping.expires_at),
                &format_ts(now),
            )
            .await;

        match outcome {
            Ok(TouchOutcome::Clicks(clicks)) => Ok(ResolvedLink {
                target_url: mapping.original_url,
                clicks,
            }),
            Ok(TouchOutcome::Expired) => {
                Err(SnaplinkError::expired(format!("short code '{code}' expired")))
            }
            Err(e) if e.is_transient() => {
                warn!("Fast store down, degraded resolve for '{}': {}", code, e);
                self.resolve_degraded(code, &mapping).await
            }
            Err(e) => Err(e),
        }
    }

    /// Fallback path: the durable copy decides expiry and takes the
    /// click directly. The write is an atomic durable increment, not a
    /// read-modify-write off the (stale) cached copy.
    async fn resolve_degraded(&self, code: &str, mapping: &UrlMapping) -> Result<ResolvedLink> {
        if mapping.expires_at < Utc::now() {
            return Err(SnaplinkError::expired(format!("short code '{code}' expired")));
        }

        self.store.increment_click(code).await?;

        Ok(ResolvedLink {
            target_url: mapping.original_url.clone(),
            clicks: mapping.click_count + 1,
        })
    }

    /// Statistics for a code. Clicks and expiry come from the live
    /// fast-store keys, never from the cached mapping; the durable copy
    /// answers when the fast store is unreachable.
    #[instrument(skip(self))]
    pub async fn stats(&self, code: &str) -> Result<UrlStats> {
        let mapping = self
            .cache
            .get_by_code(code)
            .await?
            .ok_or_else(|| SnaplinkError::not_found(format!("short code '{code}' not found")))?;

        let (click_count, expires_at) = match self.live_state(code).await {
            Ok(state) => state,
            Err(e) if e.is_transient() => {
                warn!("Fast store down, durable stats for '{}': {}", code, e);
                (None, None)
            }
            Err(e) => return Err(e),
        };

        Ok(UrlStats {
            original_url: mapping.original_url,
            short_code: mapping.short_code,
            click_count: click_count.unwrap_or(mapping.click_count),
            created_at: format_ts(mapping.created_at),
            expires_at: expires_at.unwrap_or_else(|| format_ts(mapping.expires_at)),
        })
    }

    async fn live_state(&self, code: &str) -> Result<(Option<u64>, Option<String>)> {
        let clicks = match self.fast.get(&keys::clicks(code)).await? {
            Some(raw) => Some(raw.parse::<u64>()?),
            None => None,
        };
        let expiry = self.fast.get(&keys::expiry(code)).await?;
        Ok((clicks, expiry))
    }
}
