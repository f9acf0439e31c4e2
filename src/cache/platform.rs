//! OS collaborator seams: memory-pressure notifications and background
//! execution scopes.
//!
//! Both are traits so the cache can run where the platform offers neither,
//! and so tests can drive them by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// Callback invoked when the platform reports memory pressure.
///
/// Returns false once its target is gone, after which the source drops it.
pub type PressureListener = Arc<dyn Fn() -> bool + Send + Sync>;

// == Pressure Source ==
/// Source of low-memory notifications.
pub trait PressureSource: Send + Sync {
    /// Registers a listener for every future pressure event.
    fn subscribe(&self, listener: PressureListener);
}

/// Pressure source driven explicitly by calling [`ManualPressureSource::signal`].
///
/// Listeners run synchronously on the signalling thread. Listeners that
/// report their target gone are pruned.
#[derive(Default)]
pub struct ManualPressureSource {
    listeners: Mutex<Vec<PressureListener>>,
}

impl ManualPressureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers one pressure event to every subscriber.
    pub fn signal(&self) {
        // Snapshot so a listener may subscribe without deadlocking.
        let listeners = self.listeners.lock().clone();
        debug!("Delivering memory pressure to {} listener(s)", listeners.len());
        let dead: Vec<PressureListener> = listeners
            .into_iter()
            .filter(|listener| !listener())
            .collect();

        if !dead.is_empty() {
            self.listeners
                .lock()
                .retain(|listener| !dead.iter().any(|gone| Arc::ptr_eq(gone, listener)));
            debug!("Pruned {} dead pressure listener(s)", dead.len());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl PressureSource for ManualPressureSource {
    fn subscribe(&self, listener: PressureListener) {
        self.listeners.lock().push(listener);
    }
}

// == Background Scope ==
/// Platform hook that keeps the process running while a write is in flight.
pub trait BackgroundScope: Send + Sync {
    /// Starts a scope and returns its token.
    fn begin(&self) -> u64;

    /// Ends the scope identified by `token`.
    fn end(&self, token: u64);
}

/// Background scope for platforms without process suspension.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackgroundScope;

impl BackgroundScope for NoopBackgroundScope {
    fn begin(&self) -> u64 {
        0
    }

    fn end(&self, _token: u64) {}
}

/// Background scope that counts open tokens. Useful to assert that every
/// scope opened by the disk tier is closed again.
#[derive(Debug, Default)]
pub struct CountingBackgroundScope {
    next: AtomicU64,
    open: AtomicU64,
}

impl CountingBackgroundScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_scopes(&self) -> u64 {
        self.open.load(Ordering::SeqCst)
    }

    pub fn total_scopes(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl BackgroundScope for CountingBackgroundScope {
    fn begin(&self) -> u64 {
        self.open.fetch_add(1, Ordering::SeqCst);
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn end(&self, _token: u64) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

// == Background Task Guard ==
/// Holds a background scope open until dropped.
pub struct BackgroundTaskGuard<'a> {
    scope: &'a dyn BackgroundScope,
    token: u64,
}

impl<'a> BackgroundTaskGuard<'a> {
    pub fn begin(scope: &'a dyn BackgroundScope) -> Self {
        let token = scope.begin();
        Self { scope, token }
    }
}

impl Drop for BackgroundTaskGuard<'_> {
    fn drop(&mut self) {
        self.scope.end(self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_manual_pressure_reaches_all_listeners() {
        let source = ManualPressureSource::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            source.subscribe(Arc::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            }));
        }

        source.signal();
        source.signal();

        assert_eq!(source.listener_count(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_manual_pressure_prunes_dead_listeners() {
        let source = ManualPressureSource::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let live = Arc::clone(&calls);
        source.subscribe(Arc::new(move || {
            live.fetch_add(1, Ordering::SeqCst);
            true
        }));
        source.subscribe(Arc::new(|| false));
        assert_eq!(source.listener_count(), 2);

        source.signal();
        assert_eq!(source.listener_count(), 1);

        source.signal();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_guard_ends_scope_on_drop() {
        let scope = CountingBackgroundScope::new();
        {
            let _guard = BackgroundTaskGuard::begin(&scope);
            assert_eq!(scope.open_scopes(), 1);
        }
        assert_eq!(scope.open_scopes(), 0);
        assert_eq!(scope.total_scopes(), 1);
    }

    #[test]
    fn test_guard_ends_scope_on_panic() {
        let scope = CountingBackgroundScope::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = BackgroundTaskGuard::begin(&scope);
            panic!("write failed");
        }));

        assert!(result.is_err());
        assert_eq!(scope.open_scopes(), 0);
    }
}
