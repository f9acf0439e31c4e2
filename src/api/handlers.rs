//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Cache operations
//! block on file I/O, so handlers go through the cache's async forms and
//! await their completion.

use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    extract::{Path, State},
    Json,
};
use tokio::sync::oneshot;

use crate::cache::{Cache, ManualPressureSource};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    GetResponse, HealthResponse, KeyResponse, LimitsRequest, LimitsResponse, MessageResponse,
    SetRequest, StatsResponse, TrimRequest,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Two-tier cache of string values
    pub cache: Cache<String>,
    /// Memory pressure source the cache is subscribed to
    pub pressure: Arc<ManualPressureSource>,
}

impl AppState {
    /// Creates a new AppState and subscribes the cache to a fresh pressure source.
    pub fn new(cache: Cache<String>) -> Self {
        let pressure = Arc::new(ManualPressureSource::new());
        cache.subscribe_to_pressure(pressure.as_ref());
        Self { cache, pressure }
    }

    /// Opens the cache described by the Config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pressure = Arc::new(ManualPressureSource::new());
        let cache = Cache::from_config(config, pressure.as_ref())?;
        Ok(Self { cache, pressure })
    }
}

/// Awaits the completion sink of a dispatched cache operation.
async fn completed<T>(rx: oneshot::Receiver<T>) -> Result<T> {
    rx.await
        .map_err(|_| CacheError::Internal("cache worker stopped before completing".to_string()))
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<KeyResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let (tx, rx) = oneshot::channel();
    state.cache.set_async(req.key.clone(), Some(req.value), req.cost, move || {
        let _ = tx.send(());
    });
    completed(rx).await?;

    Ok(Json(KeyResponse::stored(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let (tx, rx) = oneshot::channel();
    state.cache.get_async(key.clone(), move |value| {
        let _ = tx.send(value);
    });

    match completed(rx).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Removing an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyResponse>> {
    let (tx, rx) = oneshot::channel();
    state.cache.remove_async(key.clone(), move || {
        let _ = tx.send(());
    });
    completed(rx).await?;

    Ok(Json(KeyResponse::removed(key)))
}

/// Handler for DELETE /all
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    let (tx, rx) = oneshot::channel();
    state.cache.remove_all_async(move || {
        let _ = tx.send(());
    });
    completed(rx).await?;

    Ok(Json(MessageResponse::new("Cache cleared")))
}

/// Handler for POST /trim
pub async fn trim_handler(
    State(state): State<AppState>,
    Json(req): Json<TrimRequest>,
) -> Result<Json<MessageResponse>> {
    let cutoff = SystemTime::from(req.before);
    let (tx, rx) = oneshot::channel();
    state.cache.trim_before_date_async(cutoff, move || {
        let _ = tx.send(());
    });
    completed(rx).await?;

    Ok(Json(MessageResponse::new(format!(
        "Trimmed entries last accessed before {}",
        req.before.to_rfc3339()
    ))))
}

/// Handler for PUT /limits
pub async fn limits_handler(
    State(state): State<AppState>,
    Json(req): Json<LimitsRequest>,
) -> Json<LimitsResponse> {
    state.cache.set_maximum_cost(req.max_cost);
    state.cache.set_maximum_disk_size(req.max_disk_bytes);
    if let Some(enabled) = req.clear_on_pressure {
        state.cache.set_clear_memory_on_pressure(enabled);
    }

    Json(LimitsResponse {
        max_cost: state.cache.maximum_cost(),
        max_disk_bytes: state.cache.maximum_disk_size(),
        clear_on_pressure: state.cache.clear_memory_on_pressure(),
    })
}

/// Handler for POST /pressure
///
/// Delivers a memory pressure event, as the OS signal bridge does.
pub async fn pressure_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.pressure.signal();
    Json(MessageResponse::new("Memory pressure delivered"))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.cache.memory().stats(),
        state.cache.disk().stats(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn test_state() -> (TempDir, AppState) {
        let dir = tempdir().unwrap();
        let cache = Cache::json("handlers", dir.path()).unwrap();
        (dir, AppState::new(cache))
    }

    fn set_request(key: &str, value: &str) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value: value.to_string(),
            cost: 1,
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let (_dir, state) = test_state();

        let result = set_handler(State(state.clone()), Json(set_request("test_key", "test_value"))).await;
        assert!(result.is_ok());

        let response = get_handler(State(state.clone()), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let (_dir, state) = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let (_dir, state) = test_state();
        let stored = set_handler(State(state.clone()), Json(set_request("to_delete", "value")))
            .await
            .unwrap();
        assert_eq!(stored.key, "to_delete");

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_absent_key_succeeds() {
        let (_dir, state) = test_state();

        let result = delete_handler(State(state), Path("ghost".to_string())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_pressure_handler_clears_memory_only() {
        let (_dir, state) = test_state();
        let stored = set_handler(State(state.clone()), Json(set_request("k", "v")))
            .await
            .unwrap();
        assert_eq!(stored.key, "k");

        let response = pressure_handler(State(state.clone())).await;
        assert_eq!(response.message, "Memory pressure delivered");

        assert!(state.cache.memory().is_empty());
        let response = get_handler(State(state), Path("k".to_string())).await.unwrap();
        assert_eq!(response.value, "v");
    }

    #[tokio::test]
    async fn test_limits_handler() {
        let (_dir, state) = test_state();
        let stored = set_handler(State(state.clone()), Json(set_request("k", "v")))
            .await
            .unwrap();
        assert_eq!(stored.key, "k");

        let response = limits_handler(
            State(state.clone()),
            Json(LimitsRequest {
                max_cost: Some(0),
                max_disk_bytes: None,
                clear_on_pressure: Some(false),
            }),
        )
        .await;

        assert_eq!(response.max_cost, Some(0));
        assert!(!response.clear_on_pressure);
        assert!(state.cache.memory().is_empty());
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let (_dir, state) = test_state();

        let result = set_handler(State(state), Json(set_request("", "value"))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
