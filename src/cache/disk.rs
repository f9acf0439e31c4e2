//! Disk Store Module
//!
//! Size-bounded persistent tier. Each value is one file under
//! `{root}/{name}/objects/`, named by the encoded key. An in-memory index of
//! sizes and access times is rebuilt from the directory at startup and kept
//! in step with the files afterwards.
//!
//! One mutex serializes index mutation together with the filesystem work, so
//! the index never disagrees with what a concurrent caller observes on disk.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use filetime::FileTime;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::platform::{BackgroundScope, BackgroundTaskGuard, NoopBackgroundScope};
use crate::cache::{
    decode_key, encode_key, Codec, DiskIndexEntry, LruTracker, TierStats, DISK_DIRECTORY_PREFIX,
};
use crate::error::{CacheError, Result};

#[derive(Debug, Default)]
struct DiskState {
    index: HashMap<String, DiskIndexEntry>,
    lru: LruTracker,
    byte_count: u64,
    maximum_size: Option<u64>,
    stats: TierStats,
}

impl DiskState {
    fn insert(&mut self, key: &str, entry: DiskIndexEntry) {
        self.byte_count += entry.size_bytes;
        if let Some(old) = self.index.insert(key.to_string(), entry) {
            self.byte_count -= old.size_bytes;
        }
        self.lru.touch(key);
    }

    fn forget(&mut self, key: &str) {
        if let Some(entry) = self.index.remove(key) {
            self.byte_count -= entry.size_bytes;
            self.lru.remove(key);
        }
    }
}

// == Disk Store ==
/// File-backed key/value tier bounded by total serialized size.
pub struct DiskStore<V> {
    name: String,
    cache_directory: PathBuf,
    codec: Arc<dyn Codec<V>>,
    background: Arc<dyn BackgroundScope>,
    state: Mutex<DiskState>,
}

/// Computes `{root}/{name}/objects` after validating `name`.
pub fn cache_directory_for(name: &str, root: &Path) -> Result<PathBuf> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(CacheError::DirectoryPathInvalid(format!(
            "cache name '{}' is not a usable directory name",
            name
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(CacheError::DirectoryPathInvalid(format!(
            "cache name '{}' must be a single path segment",
            name
        )));
    }
    if root.as_os_str().is_empty() {
        return Err(CacheError::DirectoryPathInvalid(
            "root path is empty".to_string(),
        ));
    }
    Ok(root.join(name).join(DISK_DIRECTORY_PREFIX))
}

impl<V> DiskStore<V> {
    // == Constructor ==
    /// Opens (creating if needed) the disk tier for `name` under `root`.
    pub fn new(name: &str, root: impl AsRef<Path>, codec: Arc<dyn Codec<V>>) -> Result<Self> {
        Self::with_background_scope(name, root, codec, Arc::new(NoopBackgroundScope))
    }

    /// Like [`DiskStore::new`], wrapping writes in the given background scope.
    pub fn with_background_scope(
        name: &str,
        root: impl AsRef<Path>,
        codec: Arc<dyn Codec<V>>,
        background: Arc<dyn BackgroundScope>,
    ) -> Result<Self> {
        let cache_directory = cache_directory_for(name, root.as_ref())?;
        fs::create_dir_all(&cache_directory).map_err(|source| {
            CacheError::DirectoryCreateFailed {
                path: cache_directory.clone(),
                source,
            }
        })?;

        let state = Self::scan_directory(&cache_directory);
        info!(
            "Disk tier '{}' opened at {} with {} entries ({} bytes)",
            name,
            cache_directory.display(),
            state.index.len(),
            state.byte_count
        );

        Ok(Self {
            name: name.to_string(),
            cache_directory,
            codec,
            background,
            state: Mutex::new(state),
        })
    }

    /// Rebuilds the index from the files present in `directory`.
    fn scan_directory(directory: &Path) -> DiskState {
        let mut state = DiskState::default();
        let read_dir = match fs::read_dir(directory) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                warn!("Failed to scan {}: {}", directory.display(), e);
                return state;
            }
        };

        let mut found: Vec<(String, DiskIndexEntry)> = Vec::new();
        for dir_entry in read_dir.flatten() {
            let Ok(metadata) = dir_entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let file_name = dir_entry.file_name();
            let Some(key) = file_name.to_str().and_then(decode_key) else {
                debug!("Ignoring foreign file {:?}", file_name);
                continue;
            };
            let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
            found.push((key, DiskIndexEntry::new(metadata.len(), modified)));
        }

        // Oldest first, so tracker order matches modification times.
        found.sort_by(|(ka, a), (kb, b)| a.last_accessed.cmp(&b.last_accessed).then(ka.cmp(kb)));
        for (key, entry) in found {
            state.insert(&key, entry);
        }
        state
    }

    /// Path of the file that holds `key`.
    pub fn file_path_for_key(&self, key: &str) -> PathBuf {
        self.cache_directory.join(encode_key(key))
    }

    /// Deletes the file for `key` and drops it from the index.
    ///
    /// A missing file counts as removed. Returns false only if the file
    /// exists but could not be deleted, in which case the index keeps it.
    fn remove_locked(&self, state: &mut DiskState, key: &str) -> bool {
        let path = self.file_path_for_key(key);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to delete {}: {}", path.display(), e);
                return false;
            }
        }
        state.forget(key);
        true
    }

    /// Removes least recently used files until `byte_count <= limit`.
    fn trim_to_size_locked(&self, state: &mut DiskState, limit: u64) -> usize {
        if state.byte_count <= limit {
            return 0;
        }
        let oldest_first: Vec<String> = state.lru.iter_oldest_first().map(str::to_string).collect();

        let mut evicted = 0;
        for key in oldest_first {
            if state.byte_count <= limit {
                break;
            }
            if self.remove_locked(state, &key) {
                evicted += 1;
            }
        }
        state.stats.record_evictions(evicted);
        debug!(
            "Disk tier '{}' trimmed {} entries to {} bytes",
            self.name, evicted, state.byte_count
        );
        evicted
    }

    // == Remove ==
    /// Removes `key`. Absent keys and empty keys are no-ops.
    pub fn remove(&self, key: &str) {
        if key.is_empty() {
            return;
        }
        let _scope = BackgroundTaskGuard::begin(self.background.as_ref());
        let mut state = self.state.lock();
        self.remove_locked(&mut state, key);
    }

    // == Remove All ==
    /// Removes the file of every indexed key.
    pub fn remove_all(&self) {
        let _scope = BackgroundTaskGuard::begin(self.background.as_ref());
        let mut state = self.state.lock();
        let keys: Vec<String> = state.index.keys().cloned().collect();
        for key in &keys {
            self.remove_locked(&mut state, key);
        }
        info!("Disk tier '{}' cleared {} entries", self.name, keys.len());
    }

    // == Trim Before Date ==
    /// Removes every entry last accessed strictly before `cutoff`.
    pub fn trim_before_date(&self, cutoff: SystemTime) -> usize {
        let _scope = BackgroundTaskGuard::begin(self.background.as_ref());
        let mut state = self.state.lock();
        let stale: Vec<String> = state
            .index
            .iter()
            .filter(|(_, entry)| entry.accessed_before(cutoff))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = 0;
        for key in &stale {
            if self.remove_locked(&mut state, key) {
                removed += 1;
            }
        }
        state.stats.record_evictions(removed);
        removed
    }

    // == Trim To Size By Date ==
    /// Removes least recently used entries until at most `limit` bytes remain.
    pub fn trim_to_size_by_date(&self, limit: u64) -> usize {
        let _scope = BackgroundTaskGuard::begin(self.background.as_ref());
        let mut state = self.state.lock();
        self.trim_to_size_locked(&mut state, limit)
    }

    // == Set Maximum Size ==
    /// Sets the byte limit. `None` means unbounded. Takes effect on the next set.
    pub fn set_maximum_size(&self, limit: Option<u64>) {
        self.state.lock().maximum_size = limit;
    }

    // == Enumerate ==
    /// Visits index metadata from least to most recently used.
    pub fn enumerate<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &DiskIndexEntry),
    {
        let snapshot: Vec<(String, DiskIndexEntry)> = {
            let state = self.state.lock();
            state
                .lru
                .iter_oldest_first()
                .filter_map(|key| {
                    state
                        .index
                        .get(key)
                        .map(|entry| (key.to_string(), entry.clone()))
                })
                .collect()
        };

        for (key, entry) in &snapshot {
            visitor(key, entry);
        }
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache_directory(&self) -> &Path {
        &self.cache_directory
    }

    pub fn byte_count(&self) -> u64 {
        self.state.lock().byte_count
    }

    pub fn maximum_size(&self) -> Option<u64> {
        self.state.lock().maximum_size
    }

    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().index.is_empty()
    }

    /// Whether `key` is indexed. Does not touch the filesystem.
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().index.contains_key(key)
    }

    pub fn last_accessed(&self, key: &str) -> Option<SystemTime> {
        self.state
            .lock()
            .index
            .get(key)
            .map(|entry| entry.last_accessed)
    }

    pub fn stats(&self) -> TierStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.entries = state.index.len();
        stats.weight = state.byte_count;
        stats
    }

    // == Set ==
    /// Persists `value` under `key`. `None` removes the key.
    ///
    /// Failures are logged and leave the key absent. If a maximum size is
    /// configured and exceeded, least recently used files are removed before
    /// returning.
    pub fn set(&self, key: &str, value: Option<&V>) {
        if key.is_empty() {
            return;
        }
        let Some(value) = value else {
            self.remove(key);
            return;
        };

        let _scope = BackgroundTaskGuard::begin(self.background.as_ref());
        let mut state = self.state.lock();

        let bytes = match self.codec.encode(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode value for '{}': {}", key, e);
                self.remove_locked(&mut state, key);
                return;
            }
        };

        let path = self.file_path_for_key(key);
        if let Err(e) = fs::write(&path, &bytes) {
            warn!("Failed to write {}: {}", path.display(), e);
            self.remove_locked(&mut state, key);
            return;
        }

        let now = SystemTime::now();
        if let Err(e) = filetime::set_file_mtime(&path, FileTime::from_system_time(now)) {
            debug!("Failed to stamp mtime on {}: {}", path.display(), e);
        }
        let size_bytes = fs::metadata(&path)
            .map(|metadata| metadata.len())
            .unwrap_or(bytes.len() as u64);
        state.insert(key, DiskIndexEntry::new(size_bytes, now));

        if let Some(limit) = state.maximum_size {
            if state.byte_count > limit {
                self.trim_to_size_locked(&mut state, limit);
            }
        }
    }

    // == Get ==
    /// Reads and decodes the value for `key`, touching its access time.
    pub fn get(&self, key: &str) -> Option<V> {
        if key.is_empty() {
            return None;
        }
        let mut state = self.state.lock();
        let path = self.file_path_for_key(key);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Failed to read {}: {}", path.display(), e);
                } else if state.index.contains_key(key) {
                    debug!("File for '{}' vanished, dropping index entry", key);
                    state.forget(key);
                }
                state.stats.record_miss();
                return None;
            }
        };

        let Some(value) = self.codec.decode(&bytes) else {
            warn!("Failed to decode {}", path.display());
            state.stats.record_miss();
            return None;
        };

        let now = SystemTime::now();
        if let Err(e) = filetime::set_file_mtime(&path, FileTime::from_system_time(now)) {
            debug!("Failed to touch {}: {}", path.display(), e);
        }
        let size_bytes = state
            .index
            .get(key)
            .map(|entry| entry.size_bytes)
            .unwrap_or(bytes.len() as u64);
        state.insert(key, DiskIndexEntry::new(size_bytes, now));
        state.stats.record_hit();

        Some(value)
    }
}
