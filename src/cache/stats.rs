//! Cache Statistics Module
//!
//! Per-tier counters for hits, misses and evictions.

use serde::Serialize;

// == Tier Stats ==
/// Snapshot of one tier's performance counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierStats {
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of retrievals that found nothing
    pub misses: u64,
    /// Entries removed by limit enforcement or trimming
    pub evictions: u64,
    /// Current number of entries
    pub entries: usize,
    /// Aggregate weight: total cost (memory) or byte count (disk)
    pub weight: u64,
}

impl TierStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was requested.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }
}
