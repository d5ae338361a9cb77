//! Request and Response models for the worker
//!
//! This module defines the DTOs (Data Transfer Objects) exchanged over the
//! control channel and the worker's HTTP endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ControlMessage, PrecachePayload};
pub use responses::{ControlReply, HealthResponse};
