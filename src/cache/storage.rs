//! Cache Storage Module
//!
//! Owns every named partition and enforces the storage quota.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use url::Url;

use crate::cache::{CachePartition, CacheStats, CachedResponse, PartitionStats};
use crate::error::{Result, WorkerError};

/// Storage handle shared by every worker instance of a process.
pub type SharedStorage = Arc<RwLock<CacheStorage>>;

// == Cache Storage ==
/// All cache partitions, keyed by partition name.
#[derive(Debug, Default)]
pub struct CacheStorage {
    /// Partitions by name
    partitions: BTreeMap<String, CachePartition>,
    /// Lookup and write counters
    stats: CacheStats,
    /// Maximum bytes across all partitions, None = unlimited
    quota_bytes: Option<usize>,
    /// Bytes currently stored
    used_bytes: usize,
}

impl CacheStorage {
    // == Constructor ==
    /// Creates empty storage with an optional byte quota.
    pub fn new(quota_bytes: Option<usize>) -> Self {
        Self {
            quota_bytes,
            ..Self::default()
        }
    }

    /// Wraps the storage for sharing across tasks.
    pub fn shared(self) -> SharedStorage {
        Arc::new(RwLock::new(self))
    }

    // == Open ==
    /// Returns the named partition, creating it if absent.
    pub fn open(&mut self, name: &str) -> &mut CachePartition {
        self.partitions
            .entry(name.to_string())
            .or_default()
    }

    // == Match ==
    /// Looks up `url` in one partition. A missing partition is a miss.
    pub fn match_in(&mut self, name: &str, url: &Url) -> Option<CachedResponse> {
        let found = self
            .partitions
            .get(name)
            .and_then(|partition| partition.get(url))
            .cloned();
        self.record_lookup(found.is_some());
        found
    }

    /// Looks up `url` across every partition.
    pub fn match_any(&mut self, url: &Url) -> Option<CachedResponse> {
        let found = self
            .partitions
            .values()
            .find_map(|partition| partition.get(url))
            .cloned();
        self.record_lookup(found.is_some());
        found
    }

    // == Put ==
    /// Stores `response` for `url` in the named partition, overwriting any
    /// previous entry for that request.
    ///
    /// Fails with `QuotaExceeded` when the write would push storage past its
    /// quota; the partition is still created and its contents are untouched.
    pub fn put(&mut self, name: &str, url: &Url, response: CachedResponse) -> Result<()> {
        let quota = self.quota_bytes;
        let used = self.used_bytes;
        let partition = self.open(name);

        let replaced = partition.get(url).map(CachedResponse::size).unwrap_or(0);
        let needed = used - replaced + response.size();

        if let Some(limit) = quota {
            if needed > limit {
                self.stats.record_dropped_write();
                return Err(WorkerError::QuotaExceeded(format!(
                    "writing {} to {} needs {} bytes, quota is {}",
                    url, name, needed, limit
                )));
            }
        }

        partition.insert(url, response);
        self.used_bytes = needed;
        self.stats.record_write();
        self.refresh_entry_count();
        Ok(())
    }

    // == Keys ==
    /// Names of every partition.
    pub fn keys(&self) -> Vec<String> {
        self.partitions.keys().cloned().collect()
    }

    // == Delete ==
    /// Removes a partition and all its entries.
    ///
    /// Returns true if the partition existed.
    pub fn delete(&mut self, name: &str) -> bool {
        match self.partitions.remove(name) {
            Some(partition) => {
                self.used_bytes = self.used_bytes.saturating_sub(partition.size_bytes());
                self.refresh_entry_count();
                true
            }
            None => false,
        }
    }

    // == Partition Stats ==
    /// Entry count and URLs of the named partition.
    pub fn partition_stats(&self, name: &str) -> PartitionStats {
        match self.partitions.get(name) {
            Some(partition) => PartitionStats {
                name: name.to_string(),
                count: partition.len(),
                urls: partition.urls(),
            },
            None => PartitionStats::empty(name),
        }
    }

    // == Stats ==
    /// Returns current storage statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Bytes currently stored.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
    }

    fn refresh_entry_count(&mut self) {
        let total = self.partitions.values().map(CachePartition::len).sum();
        self.stats.set_total_entries(total);
    }
}
