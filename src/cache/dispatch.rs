//! Async dispatch for cache operations.
//!
//! Runs a blocking operation on a worker and hands its result to a completion
//! sink. Holds no cache state; two dispatched operations are not ordered
//! relative to each other.

use std::thread;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::warn;

// == Dispatcher ==
/// Submits blocking closures to the tokio blocking pool.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    runtime: Option<Handle>,
}

impl Dispatcher {
    /// Uses the runtime current at dispatch time, or a plain thread if none.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always dispatches onto `runtime`.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            runtime: Some(runtime),
        }
    }

    // == Dispatch ==
    /// Runs `operation` on a worker and passes its output to `completion`.
    ///
    /// The returned handle resolves once `completion` has returned.
    pub fn dispatch<R, Op, Done>(&self, operation: Op, completion: Done) -> DispatchHandle
    where
        R: Send + 'static,
        Op: FnOnce() -> R + Send + 'static,
        Done: FnOnce(R) + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = move || {
            completion(operation());
            let _ = tx.send(());
        };

        match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => {
                runtime.spawn_blocking(job);
            }
            None => {
                thread::spawn(job);
            }
        }
        DispatchHandle { done: rx }
    }
}

// == Dispatch Handle ==
/// Completion handle for a dispatched operation.
#[derive(Debug)]
pub struct DispatchHandle {
    done: oneshot::Receiver<()>,
}

impl DispatchHandle {
    /// Waits for the operation and its completion sink to finish.
    pub async fn finished(self) {
        if self.done.await.is_err() {
            warn!("Dispatched cache operation panicked before completing");
        }
    }

    /// Blocks the current thread until the operation has finished.
    ///
    /// Panics if called from within an async execution context.
    pub fn wait(self) {
        if self.done.blocking_recv().is_err() {
            warn!("Dispatched cache operation panicked before completing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};

    #[tokio::test]
    async fn test_dispatch_on_current_runtime() {
        let (tx, rx) = oneshot::channel();

        Dispatcher::new()
            .dispatch(|| 20 + 22, move |answer| {
                let _ = tx.send(answer);
            })
            .finished()
            .await;

        assert_eq!(rx.await.unwrap(), 42);
    }

    #[test]
    fn test_dispatch_without_runtime_uses_thread() {
        let (tx, rx) = mpsc::channel();

        let handle = Dispatcher::new().dispatch(
            || thread::current().id(),
            move |worker| tx.send(worker).unwrap(),
        );
        handle.wait();

        assert_ne!(rx.recv().unwrap(), thread::current().id());
    }

    #[test]
    fn test_dispatch_with_explicit_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let dispatcher = Dispatcher::with_runtime(runtime.handle().clone());
        let count = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let count = Arc::clone(&count);
                dispatcher.dispatch(
                    || (),
                    move |_| {
                        count.fetch_add(1, Ordering::SeqCst);
                    },
                )
            })
            .collect();
        for handle in handles {
            handle.wait();
        }

        assert_eq!(count.load(Ordering::SeqCst), 8);
    }
}
