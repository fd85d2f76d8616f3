use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::DatabaseConfig;
use crate::errors::{Result, SnaplinkError};

mod models;
pub mod memory;
pub mod sea_orm;

pub use self::memory::MemoryStore;
pub use self::models::UrlMapping;
pub use self::sea_orm::SeaOrmStore;

/// Durable-store seam. Mutable link state is written here only by the
/// sync worker and the degraded-mode fallback path.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlMapping>>;
    async fn find_by_url(&self, url: &str) -> Result<Option<UrlMapping>>;
    async fn insert(&self, mapping: &UrlMapping) -> Result<()>;

    /// Persist an absolute click count reconciled from the fast store
    async fn set_click_count(&self, code: &str, clicks: u64) -> Result<()>;

    /// Atomic durable increment, used only when the fast store is down
    async fn increment_click(&self, code: &str) -> Result<()>;

    /// Batch-delete links whose expiry is before `cutoff`; returns rows removed
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Bootstrap a sequence counter row at 0 if it does not exist yet
    async fn ensure_counter(&self, name: &str) -> Result<()>;

    /// Atomically increment the counter by `size` and return the new value.
    /// Failures map to `Allocation`: id uniqueness is never weakened by a
    /// fallback.
    async fn allocate_sequence_range(&self, name: &str, size: u64) -> Result<u64>;

    async fn backend_name(&self) -> String;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<dyn LinkStore>> {
        let boxed: Box<dyn LinkStore> = match config.backend.as_str() {
            "memory" => Box::new(MemoryStore::new()),
            "sea-orm" => Box::new(SeaOrmStore::connect(&config.url).await?),
            other => {
                return Err(SnaplinkError::configuration(format!(
                    "Unknown database backend: '{other}'"
                )));
            }
        };

        Ok(Arc::from(boxed))
    }
}
