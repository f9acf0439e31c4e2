//! Cache Entry Module
//!
//! Per-key records for the memory tier and the disk tier index.

use std::time::SystemTime;

// == Memory Entry ==
/// A value held by the memory tier together with its accounting metadata.
#[derive(Debug, Clone)]
pub struct MemoryEntry<V> {
    /// The stored value
    pub value: V,
    /// Caller-supplied weight, unrelated to the value's size
    pub cost: u64,
    /// Last time the entry was written or read
    pub last_accessed: SystemTime,
}

impl<V> MemoryEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(value: V, cost: u64) -> Self {
        Self {
            value,
            cost,
            last_accessed: SystemTime::now(),
        }
    }

    // == Touch ==
    /// Marks the entry as accessed now.
    pub fn touch(&mut self) {
        self.last_accessed = SystemTime::now();
    }

    /// Returns true if the entry was last accessed strictly before `cutoff`.
    pub fn accessed_before(&self, cutoff: SystemTime) -> bool {
        self.last_accessed < cutoff
    }
}

// == Disk Index Entry ==
/// Metadata the disk tier keeps in memory for one file.
///
/// The file itself is the source of truth; this mirrors its length and
/// modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskIndexEntry {
    /// Length of the serialized file in bytes
    pub size_bytes: u64,
    /// File modification time, used as the last-access time
    pub last_accessed: SystemTime,
}

impl DiskIndexEntry {
    pub fn new(size_bytes: u64, last_accessed: SystemTime) -> Self {
        Self {
            size_bytes,
            last_accessed,
        }
    }

    pub fn accessed_before(&self, cutoff: SystemTime) -> bool {
        self.last_accessed < cutoff
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_memory_entry_creation() {
        let before = SystemTime::now();
        let entry = MemoryEntry::new("value".to_string(), 7);

        assert_eq!(entry.value, "value");
        assert_eq!(entry.cost, 7);
        assert!(entry.last_accessed >= before);
    }

    #[test]
    fn test_memory_entry_touch_advances_time() {
        let mut entry = MemoryEntry::new(1u32, 0);
        let first = entry.last_accessed;

        sleep(Duration::from_millis(5));
        entry.touch();

        assert!(entry.last_accessed > first);
    }

    #[test]
    fn test_accessed_before_is_strict() {
        let entry = MemoryEntry::new((), 0);

        // Equal timestamps are retained
        assert!(!entry.accessed_before(entry.last_accessed));
        assert!(entry.accessed_before(entry.last_accessed + Duration::from_millis(1)));
    }

    #[test]
    fn test_disk_index_entry_accessed_before() {
        let now = SystemTime::now();
        let entry = DiskIndexEntry::new(100, now);

        assert!(!entry.accessed_before(now));
        assert!(entry.accessed_before(now + Duration::from_secs(1)));
        assert_eq!(entry.size_bytes, 100);
    }
}
