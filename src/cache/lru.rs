//! LRU Tracker Module
//!
//! Access-order bookkeeping shared by both tiers. Every touch hands the key a
//! fresh, strictly increasing tick, so iteration by tick is iteration from
//! least to most recently used and ties in wall-clock time stay deterministic.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction and ordered enumeration.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Tick -> key, ascending tick = ascending recency
    by_tick: BTreeMap<u64, String>,
    /// Key -> its current tick
    ticks: HashMap<String, u64>,
    next_tick: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as the most recently used, adding it if absent.
    pub fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;

        match self.ticks.get_mut(key) {
            Some(old) => {
                if let Some(owned) = self.by_tick.remove(old) {
                    self.by_tick.insert(tick, owned);
                }
                *old = tick;
            }
            None => {
                self.ticks.insert(key.to_string(), tick);
                self.by_tick.insert(tick, key.to_string());
            }
        }
    }

    // == Remove ==
    /// Stops tracking a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.by_tick.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_tick.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.by_tick.values().next().map(String::as_str)
    }

    /// Iterates keys from least to most recently used.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &str> {
        self.by_tick.values().map(String::as_str)
    }

    /// Recency rank of a key; smaller means older.
    pub fn rank(&self, key: &str) -> Option<u64> {
        self.ticks.get(key).copied()
    }

    pub fn clear(&mut self) {
        self.by_tick.clear();
        self.ticks.clear();
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");
        lru.touch("key1");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("key2"));
    }

    #[test]
    fn test_lru_evict_in_access_order() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");
        lru.remove("key2");
        lru.remove("nonexistent");

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("key2"));
        assert_eq!(
            lru.iter_oldest_first().collect::<Vec<_>>(),
            vec!["key1", "key3"]
        );
    }

    #[test]
    fn test_lru_rank_follows_touches() {
        let mut lru = LruTracker::new();

        lru.touch("x");
        lru.touch("y");
        assert!(lru.rank("x") < lru.rank("y"));

        lru.touch("x");
        assert!(lru.rank("x") > lru.rank("y"));
        assert_eq!(lru.rank("z"), None);
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");

        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.iter_oldest_first().count(), 0);
    }
}
