//! Memory Pressure Bridge Task
//!
//! Forwards an OS signal to the cache's pressure source, so operators can
//! shed the memory tier of a running server with `kill -USR1`.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::ManualPressureSource;

/// Spawns a task that delivers a pressure event for every SIGUSR1.
///
/// On platforms without SIGUSR1 the task exits immediately.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_pressure_task(pressure: Arc<ManualPressureSource>) -> JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut signals = match signal(SignalKind::user_defined1()) {
                Ok(signals) => signals,
                Err(e) => {
                    warn!("Memory pressure bridge unavailable: {}", e);
                    return;
                }
            };
            info!("Memory pressure bridge listening for SIGUSR1");

            while signals.recv().await.is_some() {
                info!("SIGUSR1 received, delivering memory pressure");
                pressure.signal();
            }
        }

        #[cfg(not(unix))]
        {
            let _ = pressure;
            warn!("Memory pressure bridge is not supported on this platform");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pressure_task_can_be_aborted() {
        let handle = spawn_pressure_task(Arc::new(ManualPressureSource::new()));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
