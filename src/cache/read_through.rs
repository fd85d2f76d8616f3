//! Cache-aside lookup of link metadata
//!
//! Check the cache, fall back to the durable store on a miss, and
//! populate only on a hit there. A link created right after a failed
//! lookup is therefore visible on the very next call.

use std::sync::Arc;

use tracing::trace;

use crate::cache::ObjectCache;
use crate::errors::Result;
use crate::storage::{LinkStore, UrlMapping};

pub struct ReadThroughCache {
    by_code: Arc<dyn ObjectCache>,
    by_url: Arc<dyn ObjectCache>,
    store: Arc<dyn LinkStore>,
}

impl ReadThroughCache {
    pub fn new(
        by_code: Arc<dyn ObjectCache>,
        by_url: Arc<dyn ObjectCache>,
        store: Arc<dyn LinkStore>,
    ) -> Self {
        Self {
            by_code,
            by_url,
            store,
        }
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Option<UrlMapping>> {
        if let Some(mapping) = self.by_code.get(code).await {
            trace!("Cache hit by code: {}", code);
            return Ok(Some(mapping));
        }

        match self.store.find_by_code(code).await? {
            Some(mapping) => {
                self.by_code.insert(code, mapping.clone()).await;
                Ok(Some(mapping))
            }
            None => Ok(None),
        }
    }

    pub async fn get_by_url(&self, url: &str) -> Result<Option<UrlMapping>> {
        if let Some(mapping) = self.by_url.get(url).await {
            trace!("Cache hit by url: {}", url);
            return Ok(Some(mapping));
        }

        match self.store.find_by_url(url).await? {
            Some(mapping) => {
                self.by_url.insert(url, mapping.clone()).await;
                Ok(Some(mapping))
            }
            None => Ok(None),
        }
    }
}
