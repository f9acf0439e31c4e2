//! Tiered Cache - A two-tier object cache
//!
//! A cost-bounded memory store backed by a size-bounded disk store, unified
//! behind one key/value façade. A miss is always a safe outcome: values may
//! vanish from either tier under pressure or capacity limits.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::Cache;
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_pressure_task;
