//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a value in both tiers
//! - `GET /get/:key` - Retrieve a value
//! - `DELETE /del/:key` - Remove a key
//! - `DELETE /all` - Remove every entry
//! - `POST /trim` - Remove entries last accessed before a date
//! - `PUT /limits` - Configure tier limits
//! - `POST /pressure` - Deliver a memory pressure event
//! - `GET /stats` - Per-tier statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
