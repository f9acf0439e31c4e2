//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::TierStats;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: String,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Acknowledgement for mutating operations that target one key.
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    /// Success message
    pub message: String,
    /// The key that was affected
    pub key: String,
}

impl KeyResponse {
    pub fn stored(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }

    pub fn removed(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' removed", key),
            key,
        }
    }
}

/// Acknowledgement for operations that affect the whole cache.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for PUT /limits
#[derive(Debug, Clone, Serialize)]
pub struct LimitsResponse {
    pub max_cost: Option<u64>,
    pub max_disk_bytes: Option<u64>,
    pub clear_on_pressure: bool,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub memory: TierStats,
    pub disk: TierStats,
    /// Memory tier hit rate (hits / (hits + misses))
    pub memory_hit_rate: f64,
    /// Disk tier hit rate, over lookups that missed memory
    pub disk_hit_rate: f64,
}

impl StatsResponse {
    pub fn new(memory: TierStats, disk: TierStats) -> Self {
        Self {
            memory_hit_rate: memory.hit_rate(),
            disk_hit_rate: disk.hit_rate(),
            memory,
            disk,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", "test_value");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains("test_value"));
    }

    #[test]
    fn test_key_response_messages() {
        assert!(KeyResponse::stored("k").message.contains("successfully"));
        assert!(KeyResponse::removed("k").message.contains("removed"));
    }

    #[test]
    fn test_stats_response_hit_rates() {
        let memory = TierStats {
            hits: 8,
            misses: 2,
            ..TierStats::default()
        };
        let resp = StatsResponse::new(memory, TierStats::default());
        assert!((resp.memory_hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.disk_hit_rate, 0.0);
    }

    #[test]
    fn test_limits_response_serializes_unbounded_as_null() {
        let resp = LimitsResponse {
            max_cost: None,
            max_disk_bytes: Some(1024),
            clear_on_pressure: true,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["max_cost"].is_null());
        assert_eq!(json["max_disk_bytes"], 1024);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
