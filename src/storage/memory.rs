//! In-process durable-store backend
//!
//! Dev and test backend behind the same `LinkStore` seam as the sea-orm
//! backend. Counts allocation round trips so the range-refill cadence is
//! observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::errors::{Result, SnaplinkError};
use crate::storage::{LinkStore, UrlMapping};

#[derive(Default)]
struct Inner {
    by_code: HashMap<String, UrlMapping>,
    code_by_url: HashMap<String, String>,
    counters: HashMap<String, u64>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    allocation_round_trips: AtomicU64,
    fail_allocations: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of counter round trips performed so far
    pub fn allocation_round_trips(&self) -> u64 {
        self.allocation_round_trips.load(Ordering::SeqCst)
    }

    /// Make subsequent range allocations fail, as an unreachable counter
    /// store would
    pub fn set_allocation_failure(&self, fail: bool) {
        self.fail_allocations.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlMapping>> {
        Ok(self.inner.lock().by_code.get(code).cloned())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<UrlMapping>> {
        let inner = self.inner.lock();
        Ok(inner
            .code_by_url
            .get(url)
            .and_then(|code| inner.by_code.get(code))
            .cloned())
    }

    async fn insert(&self, mapping: &UrlMapping) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.by_code.contains_key(&mapping.short_code) {
            return Err(SnaplinkError::database_operation(format!(
                "duplicate short code '{}'",
                mapping.short_code
            )));
        }
        inner
            .code_by_url
            .insert(mapping.original_url.clone(), mapping.short_code.clone());
        inner
            .by_code
            .insert(mapping.short_code.clone(), mapping.clone());
        Ok(())
    }

    async fn set_click_count(&self, code: &str, clicks: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.by_code.get_mut(code) {
            Some(mapping) => {
                mapping.click_count = clicks;
                Ok(())
            }
            None => Err(SnaplinkError::not_found(format!(
                "mapping '{code}' vanished before sync"
            ))),
        }
    }

    async fn increment_click(&self, code: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.by_code.get_mut(code) {
            Some(mapping) => {
                mapping.click_count += 1;
                Ok(())
            }
            None => Err(SnaplinkError::not_found(format!("mapping '{code}' not found"))),
        }
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.lock();
        let expired: Vec<String> = inner
            .by_code
            .values()
            .filter(|m| m.expires_at < cutoff)
            .map(|m| m.short_code.clone())
            .collect();

        for code in &expired {
            if let Some(mapping) = inner.by_code.remove(code) {
                inner.code_by_url.remove(&mapping.original_url);
            }
        }
        Ok(expired.len() as u64)
    }

    async fn ensure_counter(&self, name: &str) -> Result<()> {
        self.inner
            .lock()
            .counters
            .entry(name.to_string())
            .or_insert(0);
        Ok(())
    }

    async fn allocate_sequence_range(&self, name: &str, size: u64) -> Result<u64> {
        if self.fail_allocations.load(Ordering::SeqCst) {
            return Err(SnaplinkError::allocation(format!(
                "counter store unreachable for '{name}'"
            )));
        }

        let mut inner = self.inner.lock();
        let seq = inner.counters.get_mut(name).ok_or_else(|| {
            SnaplinkError::allocation(format!(
                "counter '{name}' missing; ensure_counter must run at startup"
            ))
        })?;
        *seq += size;
        self.allocation_round_trips.fetch_add(1, Ordering::SeqCst);
        Ok(*seq)
    }

    async fn backend_name(&self) -> String {
        "memory".to_string()
    }
}
