//! Background Tasks Module
//!
//! Contains background tasks that run alongside the server.
//!
//! # Tasks
//! - Pressure bridge: turns SIGUSR1 into memory pressure events

mod pressure;

pub use pressure::spawn_pressure_task;
