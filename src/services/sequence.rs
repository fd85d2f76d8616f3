//! Range-based unique id allocation
//!
//! Serves ids from an in-memory `[current, max)` window and refills the
//! window with one durable round trip per `range_size` consumed ids. A
//! crash between refill and consumption skips the remainder of the window
//! permanently; uniqueness, not density, is the contract.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::Result;
use crate::storage::LinkStore;

#[derive(Default)]
struct RangeState {
    current: u64,
    max: u64,
}

pub struct SequenceAllocator {
    store: Arc<dyn LinkStore>,
    range_size: u64,
    counters: DashMap<String, Arc<Mutex<RangeState>>>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn LinkStore>, range_size: u64) -> Self {
        Self {
            store,
            range_size: range_size.max(1),
            counters: DashMap::new(),
        }
    }

    /// Next unique id for `counter_name`. The per-counter lock is held
    /// across the refill so the bounds check and the increment serialize;
    /// contention is rare because ranges are large relative to request
    /// rate.
    pub async fn next_id(&self, counter_name: &str) -> Result<u64> {
        let cell = self
            .counters
            .entry(counter_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(RangeState::default())))
            .clone();

        let mut state = cell.lock().await;

        if state.current >= state.max {
            let new_max = self
                .store
                .allocate_sequence_range(counter_name, self.range_size)
                .await?;
            state.max = new_max;
            state.current = new_max - self.range_size;
            info!(
                "Allocated id range [{}, {}) for counter '{}'",
                state.current, state.max, counter_name
            );
        }

        let id = state.current;
        state.current += 1;
        Ok(id)
    }
}
