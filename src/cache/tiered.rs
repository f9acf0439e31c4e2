//! Tiered Cache Module
//!
//! The façade over one memory tier and one disk tier sharing a cache name.
//! Reads cascade memory then disk; writes and removals go to both tiers in
//! that order, with no atomicity across them.

use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::cache::dispatch::{DispatchHandle, Dispatcher};
use crate::cache::platform::{BackgroundScope, NoopBackgroundScope, PressureSource};
use crate::cache::{Codec, DiskStore, JsonCodec, MemoryStore};
use crate::config::Config;
use crate::error::Result;

// == Cache ==
/// Two-tier key/value cache. Cloning shares the underlying stores.
pub struct Cache<V> {
    name: Arc<str>,
    memory: Arc<MemoryStore<V>>,
    disk: Arc<DiskStore<V>>,
    dispatcher: Dispatcher,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            memory: Arc::clone(&self.memory),
            disk: Arc::clone(&self.disk),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<V> Cache<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Opens a cache whose disk tier stores values as JSON.
    pub fn json(name: &str, root: impl AsRef<Path>) -> Result<Self> {
        Self::new(name, root, Arc::new(JsonCodec::<V>::new()))
    }

    /// Opens a JSON cache from configuration, applying its limits.
    pub fn from_config(config: &Config, pressure: &dyn PressureSource) -> Result<Self> {
        let cache = Self::with_collaborators(
            &config.cache_name,
            &config.cache_root,
            Arc::new(JsonCodec::<V>::new()),
            pressure,
            Arc::new(NoopBackgroundScope),
        )?;
        cache.set_maximum_cost(config.max_cost);
        cache.set_maximum_disk_size(config.max_disk_bytes);
        cache.set_clear_memory_on_pressure(config.clear_on_pressure);
        Ok(cache)
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Opens the cache `name` under `root` without OS collaborators.
    pub fn new(name: &str, root: impl AsRef<Path>, codec: Arc<dyn Codec<V>>) -> Result<Self> {
        let disk = DiskStore::new(name, root, codec)?;
        Ok(Self::from_parts(name, MemoryStore::new(), disk))
    }

    /// Opens the cache and wires it to the platform's pressure source and
    /// background scope.
    pub fn with_collaborators(
        name: &str,
        root: impl AsRef<Path>,
        codec: Arc<dyn Codec<V>>,
        pressure: &dyn PressureSource,
        background: Arc<dyn BackgroundScope>,
    ) -> Result<Self> {
        let disk = DiskStore::with_background_scope(name, root, codec, background)?;
        let cache = Self::from_parts(name, MemoryStore::new(), disk);
        cache.subscribe_to_pressure(pressure);
        Ok(cache)
    }

    fn from_parts(name: &str, memory: MemoryStore<V>, disk: DiskStore<V>) -> Self {
        info!("Cache '{}' ready", name);
        Self {
            name: Arc::from(name),
            memory: Arc::new(memory),
            disk: Arc::new(disk),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Clears the memory tier on every pressure event while enabled.
    ///
    /// The subscription holds the memory tier weakly and is pruned by the
    /// source once the cache is dropped.
    pub fn subscribe_to_pressure(&self, pressure: &dyn PressureSource) {
        let memory: Weak<MemoryStore<V>> = Arc::downgrade(&self.memory);
        pressure.subscribe(Arc::new(move || match memory.upgrade() {
            Some(memory) => {
                memory.handle_pressure();
                true
            }
            None => false,
        }));
    }

    /// Routes async operations through `dispatcher`.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    // == Get ==
    /// Returns the memory value if present, otherwise the disk value.
    ///
    /// A disk hit is not copied into memory.
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(value) = self.memory.get(key) {
            return Some(value);
        }
        let value = self.disk.get(key);
        if value.is_none() {
            debug!("Cache '{}' miss for '{}'", self.name, key);
        }
        value
    }

    // == Set ==
    /// Stores `value` in both tiers with zero cost. `None` removes the key.
    pub fn set(&self, key: &str, value: Option<V>) {
        self.set_with_cost(key, value, 0);
    }

    /// Stores `value` in memory (with `cost`) and then on disk.
    pub fn set_with_cost(&self, key: &str, value: Option<V>, cost: u64) {
        match value {
            Some(value) => {
                self.memory.set(key, Some(value.clone()), cost);
                self.disk.set(key, Some(&value));
            }
            None => self.remove(key),
        }
    }

    // == Remove ==
    pub fn remove(&self, key: &str) {
        self.memory.remove(key);
        self.disk.remove(key);
    }

    pub fn remove_all(&self) {
        self.memory.remove_all();
        self.disk.remove_all();
    }

    /// Removes entries last accessed strictly before `cutoff` from both tiers.
    pub fn trim_before_date(&self, cutoff: SystemTime) {
        let memory = self.memory.trim_before_date(cutoff);
        let disk = self.disk.trim_before_date(cutoff);
        debug!(
            "Cache '{}' trimmed {} memory and {} disk entries",
            self.name, memory, disk
        );
    }

    // == Configuration ==
    pub fn set_maximum_cost(&self, limit: Option<u64>) {
        self.memory.set_maximum_cost(limit);
    }

    pub fn maximum_cost(&self) -> Option<u64> {
        self.memory.maximum_cost()
    }

    pub fn set_maximum_disk_size(&self, limit: Option<u64>) {
        self.disk.set_maximum_size(limit);
    }

    pub fn maximum_disk_size(&self) -> Option<u64> {
        self.disk.maximum_size()
    }

    pub fn set_clear_memory_on_pressure(&self, enabled: bool) {
        self.memory.set_clear_on_pressure(enabled);
    }

    pub fn clear_memory_on_pressure(&self) -> bool {
        self.memory.clear_on_pressure()
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memory(&self) -> &MemoryStore<V> {
        &self.memory
    }

    pub fn disk(&self) -> &DiskStore<V> {
        &self.disk
    }

    // == Async Forms ==
    /// Looks up `key` on a worker and passes the result to `completion`.
    pub fn get_async<F>(&self, key: impl Into<String>, completion: F) -> DispatchHandle
    where
        F: FnOnce(Option<V>) + Send + 'static,
    {
        let cache = self.clone();
        let key = key.into();
        self.dispatcher
            .dispatch(move || cache.get(&key), completion)
    }

    pub fn set_async<F>(
        &self,
        key: impl Into<String>,
        value: Option<V>,
        cost: u64,
        completion: F,
    ) -> DispatchHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let cache = self.clone();
        let key = key.into();
        self.dispatcher.dispatch(
            move || cache.set_with_cost(&key, value, cost),
            move |()| completion(),
        )
    }

    pub fn remove_async<F>(&self, key: impl Into<String>, completion: F) -> DispatchHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let cache = self.clone();
        let key = key.into();
        self.dispatcher
            .dispatch(move || cache.remove(&key), move |()| completion())
    }

    pub fn remove_all_async<F>(&self, completion: F) -> DispatchHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let cache = self.clone();
        self.dispatcher
            .dispatch(move || cache.remove_all(), move |()| completion())
    }

    pub fn trim_before_date_async<F>(&self, cutoff: SystemTime, completion: F) -> DispatchHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let cache = self.clone();
        self.dispatcher.dispatch(
            move || cache.trim_before_date(cutoff),
            move |()| completion(),
        )
    }
}
