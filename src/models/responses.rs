//! Response DTOs for the worker
//!
//! Defines control replies and the health report.

use serde::Serialize;

use crate::cache::{CacheStats, PartitionStats};

/// Reply to a control message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlReply {
    /// Reply to `get-version`
    Version { version: String },
    /// Reply to `clear-cache` and `precache-urls`
    Success { success: bool },
    /// Reply to `get-cache-stats`, one item per partition
    CacheStats(Vec<PartitionStats>),
}

impl ControlReply {
    pub fn version(version: impl Into<String>) -> Self {
        ControlReply::Version {
            version: version.into(),
        }
    }

    pub fn success() -> Self {
        ControlReply::Success { success: true }
    }
}

/// Response body for the health endpoint (GET /__worker/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Active cache version
    pub version: String,
    /// Lifecycle state of the worker
    pub state: String,
    /// Storage counters
    pub stats: CacheStats,
    /// Lookup hit rate
    pub hit_rate: f64,
    /// Background refreshes currently running
    pub revalidations_in_flight: usize,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn new(
        version: impl Into<String>,
        state: impl Into<String>,
        stats: CacheStats,
        revalidations_in_flight: usize,
    ) -> Self {
        Self {
            status: "healthy".to_string(),
            version: version.into(),
            state: state.into(),
            hit_rate: stats.hit_rate(),
            stats,
            revalidations_in_flight,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
