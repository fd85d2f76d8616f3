//! Dirty-set write-back synchronization
//!
//! A timer-driven batch job reconciles fast-store click counts into the
//! durable store. The dirty-set rename is the ordering boundary: touches
//! completing before the rename land in this cycle's batch, later touches
//! recreate the active set and are picked up next cycle. Work is O(dirty),
//! never O(total links).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::faststore::{FastStore, keys};
use crate::storage::LinkStore;

/// What one cycle actually did, for logs and tests
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub skipped: usize,
    pub expired_removed: u64,
    pub aborted: bool,
}

pub struct SyncWorker {
    fast: Arc<dyn FastStore>,
    store: Arc<dyn LinkStore>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl SyncWorker {
    pub fn new(
        fast: Arc<dyn FastStore>,
        store: Arc<dyn LinkStore>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            fast,
            store,
            interval,
            shutdown,
        }
    }

    /// Run cycles on the configured interval until shutdown is signalled.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the immediate first tick would race startup seeding
        ticker.tick().await;

        info!("Sync worker started, interval {:?}", self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sync_cycle().await {
                        warn!("Sync cycle failed, will retry next interval: {}", e);
                    }
                }
                changed = self.shutdown.changed() => {
                    // a dropped sender also means the process is going away
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("Sync worker shutting down");
                        return;
                    }
                }
            }
        }
    }

    fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// One reconciliation pass. Idempotent: re-running after an
    /// interruption re-persists the same absolute counts.
    pub async fn sync_cycle(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        // A non-empty processing set is residue of an interrupted cycle;
        // merge it into this batch instead of abandoning it.
        let leftover = self.fast.set_members(keys::DIRTY_PROCESSING).await?;
        if !leftover.is_empty() {
            warn!(
                "Recovered {} codes from an interrupted sync cycle",
                leftover.len()
            );
        }

        let mut batch: BTreeSet<String> = leftover.iter().cloned().collect();

        if self
            .fast
            .rename(keys::DIRTY_SET, keys::DIRTY_PROCESSING)
            .await?
        {
            // the rename overwrote the processing key; put the leftover
            // back so a second interruption cannot lose it
            for code in &leftover {
                self.fast.set_add(keys::DIRTY_PROCESSING, code).await?;
            }
            batch.extend(self.fast.set_members(keys::DIRTY_PROCESSING).await?);
        } else {
            // no touches since the last swap
            debug!("No new dirty codes this cycle");
        }

        if batch.is_empty() {
            self.fast.delete(keys::DIRTY_PROCESSING).await.ok();
            report.expired_removed = self.cleanup_expired().await;
            return Ok(report);
        }

        debug!("Syncing {} dirty codes", batch.len());
        for code in &batch {
            if self.shutting_down() {
                // leave the processing key in place; the next cycle
                // merges it back in, and per-code sync is idempotent
                warn!("Sync cycle aborted by shutdown after {} codes", report.synced);
                report.aborted = true;
                return Ok(report);
            }

            match self.sync_one(code).await {
                Ok(true) => report.synced += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Sync failed for '{}', skipping: {}", code, e);
                    report.skipped += 1;
                }
            }
        }

        if let Err(e) = self.fast.delete(keys::DIRTY_PROCESSING).await {
            warn!("Failed to clear processing set: {}", e);
        }

        report.expired_removed = self.cleanup_expired().await;

        info!(
            "Sync cycle complete: {} synced, {} skipped, {} expired removed",
            report.synced, report.skipped, report.expired_removed
        );
        Ok(report)
    }

    /// Persist one code's fast-store count. `Ok(false)` means there was
    /// nothing to persist (the click key has been evicted).
    async fn sync_one(&self, code: &str) -> Result<bool> {
        let Some(raw) = self.fast.get(&keys::clicks(code)).await? else {
            debug!("No click key for '{}', nothing to persist", code);
            return Ok(false);
        };

        let clicks: u64 = raw.parse()?;
        self.store.set_click_count(code, clicks).await?;
        Ok(true)
    }

    /// Best-effort removal of durably expired links; failures are logged,
    /// never fatal to the cycle.
    async fn cleanup_expired(&self) -> u64 {
        match self.store.delete_expired_before(Utc::now()).await {
            Ok(removed) => {
                if removed > 0 {
                    info!("Removed {} expired links", removed);
                }
                removed
            }
            Err(e) => {
                warn!("Expired-link cleanup failed: {}", e);
                0
            }
        }
    }
}
