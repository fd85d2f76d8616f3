//! Fixed-window request rate limiting
//!
//! The counter and its window expiry are maintained by one atomic
//! fast-store bundle, so two concurrent first-requests cannot both skip
//! setting the expiry. On store failure the limiter fails open:
//! availability wins over strict enforcement.

use std::sync::Arc;

use tracing::error;

use crate::config::RateLimitConfig;
use crate::faststore::{FastStore, keys};

pub struct RateLimiter {
    fast: Arc<dyn FastStore>,
    max_requests: u64,
    window_seconds: u64,
}

impl RateLimiter {
    pub fn new(fast: Arc<dyn FastStore>, config: &RateLimitConfig) -> Self {
        Self {
            fast,
            max_requests: config.max_requests,
            window_seconds: config.window_seconds,
        }
    }

    pub async fn allow(&self, client_id: &str) -> bool {
        let key = keys::rate_limit(client_id);

        match self.fast.rate_incr(&key, self.window_seconds).await {
            Ok(count) => count <= self.max_requests,
            Err(e) => {
                error!("Rate limit check failed for '{}', failing open: {}", client_id, e);
                true
            }
        }
    }
}
