//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::cache::encode_key;

/// Maximum length in bytes of a key's encoded file name.
pub const MAX_KEY_LENGTH: usize = 200;

/// Maximum memory tier cost accepted for one entry.
pub const MAX_ENTRY_COST: u64 = u32::MAX as u64;

/// Request body for the SET operation (PUT /set)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Memory tier cost, defaults to 0
    #[serde(default)]
    pub cost: u64,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if encode_key(&self.key).len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Encoded key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.cost > MAX_ENTRY_COST {
            return Some(format!("Cost exceeds maximum of {}", MAX_ENTRY_COST));
        }
        None
    }
}

/// Request body for POST /trim
#[derive(Debug, Clone, Deserialize)]
pub struct TrimRequest {
    /// Entries last accessed strictly before this instant are removed
    pub before: DateTime<Utc>,
}

/// Request body for PUT /limits
///
/// Omitted or null limits mean unbounded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitsRequest {
    #[serde(default)]
    pub max_cost: Option<u64>,
    #[serde(default)]
    pub max_disk_bytes: Option<u64>,
    #[serde(default)]
    pub clear_on_pressure: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert_eq!(req.cost, 0);
    }

    #[test]
    fn test_set_request_with_cost() {
        let json = r#"{"key": "test", "value": "hello", "cost": 60}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.cost, 60);
    }

    #[test]
    fn test_validate_keys() {
        let mut req = SetRequest {
            key: "".to_string(),
            value: "test".to_string(),
            cost: 0,
        };
        assert!(req.validate().is_some());

        req.key = "x".repeat(MAX_KEY_LENGTH + 1);
        assert!(req.validate().is_some());

        // 80 slashes encode to 240 bytes
        req.key = "/".repeat(80);
        assert!(req.validate().is_some());

        req.key = "images/cat.png".to_string();
        assert!(req.validate().is_none());

        req.cost = MAX_ENTRY_COST;
        assert!(req.validate().is_none());
        req.cost = u64::MAX;
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_trim_request_parses_rfc3339() {
        let req: TrimRequest = serde_json::from_str(r#"{"before": "2024-05-01T12:00:00Z"}"#).unwrap();
        assert_eq!(req.before.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn test_limits_request_defaults_to_unbounded() {
        let req: LimitsRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.max_cost, None);
        assert_eq!(req.max_disk_bytes, None);
        assert_eq!(req.clear_on_pressure, None);
    }
}
