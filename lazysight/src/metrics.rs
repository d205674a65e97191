//! Load metrics for observability.
//!
//! Counters are plain `Cell`s: the loader runs on a single thread, so a
//! tracker completing a fetch and the coordinator scanning the registry never
//! touch them concurrently.
//!
//! ```text
//! Trackers / Strategies ─────► LazyMetrics ─────► MetricsSnapshot
//!                               (counters)        (point-in-time copy)
//! ```

use std::cell::Cell;
use std::fmt;

/// Live counters shared by a coordinator and its trackers.
#[derive(Debug, Default)]
pub struct LazyMetrics {
    attached: Cell<u64>,
    detached: Cell<u64>,
    retired: Cell<u64>,
    cache_hits: Cell<u64>,
    fetches_started: Cell<u64>,
    fetches_succeeded: Cell<u64>,
    fetches_failed: Cell<u64>,
    loads_in_flight: Cell<u64>,
    ticks: Cell<u64>,
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get().saturating_add(1));
}

impl LazyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracker_attached(&self) {
        bump(&self.attached);
    }

    pub fn tracker_detached(&self) {
        bump(&self.detached);
    }

    /// A resolved tracker was dropped by its strategy.
    pub fn tracker_retired(&self) {
        bump(&self.retired);
    }

    pub fn cache_hit(&self) {
        bump(&self.cache_hits);
    }

    pub fn fetch_started(&self) {
        bump(&self.fetches_started);
        bump(&self.loads_in_flight);
    }

    pub fn fetch_succeeded(&self) {
        bump(&self.fetches_succeeded);
        self.fetch_settled();
    }

    pub fn fetch_failed(&self) {
        bump(&self.fetches_failed);
        self.fetch_settled();
    }

    /// A throttled polling pass ran.
    pub fn tick(&self) {
        bump(&self.ticks);
    }

    fn fetch_settled(&self) {
        self.loads_in_flight.set(self.loads_in_flight.get().saturating_sub(1));
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attached: self.attached.get(),
            detached: self.detached.get(),
            retired: self.retired.get(),
            cache_hits: self.cache_hits.get(),
            fetches_started: self.fetches_started.get(),
            fetches_succeeded: self.fetches_succeeded.get(),
            fetches_failed: self.fetches_failed.get(),
            loads_in_flight: self.loads_in_flight.get(),
            ticks: self.ticks.get(),
        }
    }
}

/// Point-in-time copy of [`LazyMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attached: u64,
    pub detached: u64,
    pub retired: u64,
    pub cache_hits: u64,
    pub fetches_started: u64,
    pub fetches_succeeded: u64,
    pub fetches_failed: u64,
    pub loads_in_flight: u64,
    pub ticks: u64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attached={} detached={} retired={} cache_hits={} fetches={}/{} ok, {} failed, {} in flight, ticks={}",
            self.attached,
            self.detached,
            self.retired,
            self.cache_hits,
            self.fetches_succeeded,
            self.fetches_started,
            self.fetches_failed,
            self.loads_in_flight,
            self.ticks
        )
    }
}
