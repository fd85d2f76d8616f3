use async_trait::async_trait;

use crate::storage::UrlMapping;

pub mod moka;
pub mod read_through;

pub use self::moka::MokaObjectCache;
pub use self::read_through::ReadThroughCache;

/// Object cache seam for link metadata.
///
/// Absence is never cached, so `None` always means "ask the durable
/// store". Cached mappings are trusted for immutable fields only;
/// clicks and expiry are owned by the fast-store keys.
#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<UrlMapping>;
    async fn insert(&self, key: &str, value: UrlMapping);
    async fn remove(&self, key: &str);
}
