//! API Module
//!
//! HTTP surface of the worker: control endpoints and the caching proxy.
//!
//! # Endpoints
//! - `POST /__worker/message` - Send a control message
//! - `GET /__worker/health` - Health check endpoint
//! - fallback - fetch interception

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
