//! In-process fast-store backend
//!
//! One mutex over the whole keyspace gives every trait method the same
//! atomicity the redis backend gets from server-side scripts. TTLs are
//! checked lazily on read, the way redis expires from the reader's point
//! of view. `set_unavailable` simulates an outage so fail-open and
//! degraded-mode paths can be exercised.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{Result, SnaplinkError};
use crate::faststore::{FastStore, TouchOutcome, keys};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn live(&self) -> bool {
        self.expires_at.is_none_or(|deadline| Instant::now() < deadline)
    }
}

#[derive(Default)]
struct Inner {
    strings: HashMap<String, Entry>,
    sets: HashMap<String, BTreeSet<String>>,
}

impl Inner {
    fn get_live(&mut self, key: &str) -> Option<&mut Entry> {
        if self.strings.get(key).is_some_and(|e| !e.live()) {
            self.strings.remove(key);
        }
        self.strings.get_mut(key)
    }
}

#[derive(Default)]
pub struct MemoryFastStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
}

impl MemoryFastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a fast-store outage: every call fails until cleared
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(SnaplinkError::fast_store_unavailable("fast store is down"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FastStore for MemoryFastStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        Ok(inner.get_live(key).map(|e| e.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        inner.strings.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_seconds)),
            },
        );
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        self.check_available()?;
        let inner = self.inner.lock();
        Ok(inner
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn rename(&self, src: &str, dst: &str) -> Result<bool> {
        self.check_available()?;
        let mut inner = self.inner.lock();

        if let Some(set) = inner.sets.remove(src) {
            inner.sets.insert(dst.to_string(), set);
            return Ok(true);
        }
        if inner.get_live(src).is_some() {
            let entry = inner.strings.remove(src).unwrap();
            inner.strings.insert(dst.to_string(), entry);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.lock();
        inner.strings.remove(key);
        inner.sets.remove(key);
        Ok(())
    }

    async fn touch(
        &self,
        code: &str,
        fallback_clicks: u64,
        fallback_expiry: &str,
        now: &str,
    ) -> Result<TouchOutcome> {
        self.check_available()?;

        // the whole bundle runs under one lock acquisition, mirroring the
        // script's indivisibility
        let mut inner = self.inner.lock();

        let clicks_key = keys::clicks(code);
        let expiry_key = keys::expiry(code);

        if inner.get_live(&clicks_key).is_none() {
            inner.strings.insert(
                clicks_key.clone(),
                Entry {
                    value: fallback_clicks.to_string(),
                    expires_at: None,
                },
            );
        }
        if inner.get_live(&expiry_key).is_none() {
            inner.strings.insert(
                expiry_key.clone(),
                Entry {
                    value: fallback_expiry.to_string(),
                    expires_at: None,
                },
            );
        }

        let stored_expiry = inner
            .get_live(&expiry_key)
            .map(|e| e.value.clone())
            .unwrap_or_default();
        if stored_expiry.as_str() < now {
            return Ok(TouchOutcome::Expired);
        }

        let entry = inner
            .get_live(&clicks_key)
            .ok_or_else(|| SnaplinkError::fast_store_unavailable("click key lost mid-touch"))?;
        let clicks: u64 = entry.value.parse().unwrap_or(0) + 1;
        entry.value = clicks.to_string();

        inner
            .sets
            .entry(keys::DIRTY_SET.to_string())
            .or_default()
            .insert(code.to_string());

        Ok(TouchOutcome::Clicks(clicks))
    }

    async fn rate_incr(&self, key: &str, window_seconds: u64) -> Result<u64> {
        self.check_available()?;
        let mut inner = self.inner.lock();

        match inner.get_live(key) {
            Some(entry) => {
                // INCR does not refresh the window's TTL
                let count: u64 = entry.value.parse().unwrap_or(0) + 1;
                entry.value = count.to_string();
                Ok(count)
            }
            None => {
                inner.strings.insert(
                    key.to_string(),
                    Entry {
                        value: "1".to_string(),
                        expires_at: Some(Instant::now() + Duration::from_secs(window_seconds)),
                    },
                );
                Ok(1)
            }
        }
    }
}
