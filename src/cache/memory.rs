//! Memory Store Module
//!
//! Cost-bounded in-process tier. All state lives behind one reader/writer
//! lock; reads that touch an entry take the write side.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{LruTracker, MemoryEntry, TierStats};

#[derive(Debug)]
struct MemoryState<V> {
    entries: HashMap<String, MemoryEntry<V>>,
    lru: LruTracker,
    total_cost: u64,
    maximum_cost: Option<u64>,
    stats: TierStats,
}

impl<V> MemoryState<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            total_cost: 0,
            maximum_cost: None,
            stats: TierStats::new(),
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<MemoryEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.total_cost -= entry.cost;
        Some(entry)
    }

    /// Evicts least recently used entries until `total_cost <= limit`.
    fn evict_lru_to(&mut self, limit: u64) -> usize {
        let mut evicted = 0;
        while self.total_cost > limit {
            let Some(key) = self.lru.evict_oldest() else {
                break;
            };
            self.remove_entry(&key);
            evicted += 1;
        }
        self.stats.record_evictions(evicted);
        evicted
    }
}

// == Memory Store ==
/// In-memory key/value tier bounded by the sum of caller-supplied costs.
#[derive(Debug)]
pub struct MemoryStore<V> {
    state: RwLock<MemoryState<V>>,
    clear_on_pressure: AtomicBool,
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryStore<V> {
    // == Constructor ==
    /// Creates an empty, unbounded store that clears itself on memory pressure.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::new()),
            clear_on_pressure: AtomicBool::new(true),
        }
    }

    // == Set ==
    /// Stores `value` under `key` with the given cost.
    ///
    /// `None` removes the key. Overwriting replaces the old cost. If a
    /// maximum cost is configured, least recently used entries are evicted
    /// before returning until the total fits.
    ///
    /// A write whose cost would overflow the total is dropped, and any
    /// previous value for `key` is removed with it.
    pub fn set(&self, key: &str, value: Option<V>, cost: u64) {
        if key.is_empty() {
            return;
        }
        let Some(value) = value else {
            self.remove(key);
            return;
        };

        let mut state = self.state.write();
        state.remove_entry(key);
        let Some(total_cost) = state.total_cost.checked_add(cost) else {
            warn!(
                "Memory tier dropped '{}': cost {} overflows total {}",
                key, cost, state.total_cost
            );
            return;
        };
        state.entries.insert(key.to_string(), MemoryEntry::new(value, cost));
        state.total_cost = total_cost;
        state.lru.touch(key);

        if let Some(limit) = state.maximum_cost {
            let evicted = state.evict_lru_to(limit);
            if evicted > 0 {
                debug!("Memory tier evicted {} entries after set of '{}'", evicted, key);
            }
        }
    }

    // == Remove ==
    /// Removes `key` if present.
    pub fn remove(&self, key: &str) {
        if key.is_empty() {
            return;
        }
        self.state.write().remove_entry(key);
    }

    // == Remove All ==
    /// Clears every entry and resets the total cost.
    pub fn remove_all(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.lru.clear();
        state.total_cost = 0;
    }

    // == Trim Before Date ==
    /// Removes every entry last accessed strictly before `cutoff`.
    ///
    /// Returns the number of entries removed.
    pub fn trim_before_date(&self, cutoff: SystemTime) -> usize {
        let mut state = self.state.write();
        let stale: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.accessed_before(cutoff))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            state.remove_entry(key);
        }
        state.stats.record_evictions(stale.len());
        stale.len()
    }

    // == Set Maximum Cost ==
    /// Sets the cost limit. `None` means unbounded.
    ///
    /// A new limit is enforced immediately by evicting least recently used
    /// entries.
    pub fn set_maximum_cost(&self, limit: Option<u64>) {
        let mut state = self.state.write();
        state.maximum_cost = limit;
        if let Some(limit) = limit {
            let evicted = state.evict_lru_to(limit);
            info!(
                "Memory tier cost limit set to {}, evicted {} entries",
                limit, evicted
            );
        }
    }

    // == Trim To Cost By Date ==
    /// Evicts least recently used entries until the total cost is at most `limit`.
    pub fn trim_to_cost_by_date(&self, limit: u64) -> usize {
        self.state.write().evict_lru_to(limit)
    }

    // == Trim To Cost ==
    /// Evicts the costliest entries first until the total cost is at most `limit`.
    ///
    /// Entries of equal cost go in least-recently-used order. Never called
    /// implicitly.
    pub fn trim_to_cost(&self, limit: u64) -> usize {
        let mut state = self.state.write();
        if state.total_cost <= limit {
            return 0;
        }

        let mut candidates: Vec<(u64, u64, String)> = state
            .entries
            .iter()
            .map(|(key, entry)| {
                let rank = state.lru.rank(key).unwrap_or(u64::MAX);
                (entry.cost, rank, key.clone())
            })
            .collect();
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut evicted = 0;
        for (_, _, key) in candidates {
            if state.total_cost <= limit {
                break;
            }
            state.remove_entry(&key);
            evicted += 1;
        }
        state.stats.record_evictions(evicted);
        evicted
    }

    // == Pressure ==
    /// Whether a memory pressure event clears this store.
    pub fn clear_on_pressure(&self) -> bool {
        self.clear_on_pressure.load(Ordering::SeqCst)
    }

    pub fn set_clear_on_pressure(&self, enabled: bool) {
        self.clear_on_pressure.store(enabled, Ordering::SeqCst);
    }

    /// Reacts to a memory pressure event. Returns true if the store was cleared.
    pub fn handle_pressure(&self) -> bool {
        if !self.clear_on_pressure() {
            debug!("Memory pressure ignored, clearing disabled");
            return false;
        }
        let mut state = self.state.write();
        let count = state.entries.len();
        state.entries.clear();
        state.lru.clear();
        state.total_cost = 0;
        state.stats.record_evictions(count);
        info!("Memory pressure cleared {} entries", count);
        true
    }

    // == Accessors ==
    pub fn total_cost(&self) -> u64 {
        self.state.read().total_cost
    }

    pub fn maximum_cost(&self) -> Option<u64> {
        self.state.read().maximum_cost
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.read().entries.contains_key(key)
    }

    /// Returns the recorded last-access time for `key` without touching it.
    pub fn last_accessed(&self, key: &str) -> Option<SystemTime> {
        self.state
            .read()
            .entries
            .get(key)
            .map(|entry| entry.last_accessed)
    }

    pub fn stats(&self) -> TierStats {
        let state = self.state.read();
        let mut stats = state.stats.clone();
        stats.entries = state.entries.len();
        stats.weight = state.total_cost;
        stats
    }
}

impl<V: Clone> MemoryStore<V> {
    // == Get ==
    /// Returns the value for `key`, marking it as most recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        if key.is_empty() {
            return None;
        }
        let mut state = self.state.write();
        let state = &mut *state;
        match state.entries.get_mut(key) {
            Some(entry) => {
                entry.touch();
                let value = entry.value.clone();
                state.lru.touch(key);
                state.stats.record_hit();
                Some(value)
            }
            None => {
                state.stats.record_miss();
                None
            }
        }
    }

    // == Enumerate ==
    /// Visits every entry from least to most recently used.
    ///
    /// The visitor sees a snapshot taken under the lock, so it may call back
    /// into the store.
    pub fn enumerate<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &V),
    {
        let snapshot: Vec<(String, V)> = {
            let state = self.state.read();
            state
                .lru
                .iter_oldest_first()
                .filter_map(|key| {
                    state
                        .entries
                        .get(key)
                        .map(|entry| (key.to_string(), entry.value.clone()))
                })
                .collect()
        };

        for (key, value) in &snapshot {
            visitor(key, value);
        }
    }
}
