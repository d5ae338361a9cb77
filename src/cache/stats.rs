//! Cache Statistics Module
//!
//! Tracks storage metrics and per-partition contents.

use serde::Serialize;

// == Cache Stats ==
/// Tracks storage metrics across all partitions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found an entry
    pub hits: u64,
    /// Number of lookups that found nothing
    pub misses: u64,
    /// Number of successful writes
    pub writes: u64,
    /// Number of writes dropped because storage refused them
    pub dropped_writes: u64,
    /// Current number of entries across all partitions
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the lookup hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_dropped_write(&mut self) {
        self.dropped_writes += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Partition Stats ==
/// Contents of one partition as reported over the control channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionStats {
    /// Partition name, e.g. `static-v2.1.0`
    pub name: String,
    /// Number of stored entries
    pub count: usize,
    /// URL of every stored entry
    pub urls: Vec<String>,
}

impl PartitionStats {
    /// Stats for a partition that does not exist yet.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            urls: Vec::new(),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.writes, 0);
        assert_eq!(stats.dropped_writes, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_writes() {
        let mut stats = CacheStats::new();
        stats.record_write();
        stats.record_dropped_write();
        stats.record_dropped_write();
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.dropped_writes, 2);
    }

    #[test]
    fn test_empty_partition_stats_serialize() {
        let stats = PartitionStats::empty("data-v1");
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["name"], "data-v1");
        assert_eq!(json["count"], 0);
        assert!(json["urls"].as_array().unwrap().is_empty());
    }
}
