//! Cache Module
//!
//! Versioned, named partitions of stored HTTP responses.

mod entry;
mod partition;
mod stats;
mod storage;
mod version;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{format_http_date, parse_http_date, CachedResponse};
pub use partition::CachePartition;
pub use stats::{CacheStats, PartitionStats};
pub use storage::{CacheStorage, SharedStorage};
pub use version::{CacheVersion, PartitionKind};
