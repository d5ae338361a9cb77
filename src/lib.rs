//! Worker Cache - A multi-strategy HTTP caching layer
//!
//! Intercepts GET requests, classifies them by URL pattern and serves them
//! through versioned cache partitions with an offline fallback.

pub mod api;
pub mod cache;
pub mod config;
pub mod control;
pub mod error;
pub mod fallback;
pub mod models;
pub mod network;
pub mod policy;
pub mod strategy;
pub mod tasks;
pub mod worker;

pub use api::AppState;
pub use config::Config;
pub use control::{spawn_control_task, ControlHandle};
pub use error::{Result, WorkerError};
pub use worker::{Worker, WorkerState};
