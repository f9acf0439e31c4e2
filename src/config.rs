//! Configuration Module
//!
//! Loads cache and server settings from environment variables.

use std::env;
use std::path::PathBuf;

/// Cache and server configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache name; the disk tier lives under `{cache_root}/{cache_name}`
    pub cache_name: String,
    /// Root directory for the disk tier
    pub cache_root: PathBuf,
    /// Memory tier cost limit, None = unbounded
    pub max_cost: Option<u64>,
    /// Disk tier byte limit, None = unbounded
    pub max_disk_bytes: Option<u64>,
    /// Whether memory pressure clears the memory tier
    pub clear_on_pressure: bool,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Cache name (default: "default")
    /// - `CACHE_ROOT` - Root directory (default: `$TMPDIR/tiered-cache`)
    /// - `MAX_COST` - Memory tier cost limit (default: unbounded)
    /// - `MAX_DISK_BYTES` - Disk tier byte limit (default: unbounded)
    /// - `CLEAR_ON_PRESSURE` - Clear memory on pressure (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_name: env::var("CACHE_NAME").unwrap_or(defaults.cache_name),
            cache_root: env::var("CACHE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_root),
            max_cost: env::var("MAX_COST").ok().and_then(|v| v.parse().ok()),
            max_disk_bytes: env::var("MAX_DISK_BYTES")
                .ok()
                .and_then(|v| v.parse().ok()),
            clear_on_pressure: env::var("CLEAR_ON_PRESSURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.clear_on_pressure),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_name: "default".to_string(),
            cache_root: env::temp_dir().join("tiered-cache"),
            max_cost: None,
            max_disk_bytes: None,
            clear_on_pressure: true,
            server_port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_name, "default");
        assert!(config.cache_root.ends_with("tiered-cache"));
        assert_eq!(config.max_cost, None);
        assert_eq!(config.max_disk_bytes, None);
        assert!(config.clear_on_pressure);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_NAME");
        env::remove_var("MAX_COST");
        env::remove_var("MAX_DISK_BYTES");
        env::remove_var("CLEAR_ON_PRESSURE");
        env::remove_var("SERVER_PORT");

        let config = Config::from_env();
        assert_eq!(config.cache_name, "default");
        assert_eq!(config.max_cost, None);
        assert_eq!(config.max_disk_bytes, None);
        assert!(config.clear_on_pressure);
        assert_eq!(config.server_port, 3000);
    }
}
