//! Control message handling for the worker.

use tracing::{info, warn};

use crate::cache::PartitionKind;
use crate::models::{ControlMessage, ControlReply};
use crate::worker::Worker;

impl Worker {
    /// Applies one control message. Returns the reply, if the message
    /// expects one.
    pub async fn handle_message(&self, message: ControlMessage) -> Option<ControlReply> {
        match message {
            ControlMessage::SkipWaiting => {
                if let Err(e) = self.skip_waiting().await {
                    warn!("skip-waiting ignored: {}", e);
                }
                None
            }
            ControlMessage::GetVersion => Some(ControlReply::version(self.version().as_str())),
            ControlMessage::ClearCache => {
                self.clear_cache().await;
                Some(ControlReply::success())
            }
            ControlMessage::GetCacheStats => {
                let storage = self.storage().read().await;
                let stats = PartitionKind::ALL
                    .iter()
                    .map(|kind| storage.partition_stats(&self.version().partition_name(*kind)))
                    .collect();
                Some(ControlReply::CacheStats(stats))
            }
            ControlMessage::PrecacheUrls(payload) => {
                self.precache(&payload.urls).await;
                Some(ControlReply::success())
            }
        }
    }

    /// Deletes every partition, whatever its version.
    pub async fn clear_cache(&self) -> usize {
        let mut storage = self.storage().write().await;
        let names = storage.keys();
        for name in &names {
            storage.delete(name);
        }
        info!("Cleared {} cache partitions", names.len());
        names.len()
    }

    /// Fetches and stores each URL in the dynamic partition. Returns the
    /// number stored; failures are logged and skipped.
    pub async fn precache(&self, urls: &[String]) -> usize {
        let partition = self.version().partition_name(PartitionKind::Dynamic);
        let mut stored = 0;

        for target in urls {
            match self.fetch_and_store(target, &partition).await {
                Ok(true) => stored += 1,
                Ok(false) => {}
                Err(e) => warn!("Precache of {} failed: {}", target, e),
            }
        }

        info!("Precached {}/{} URLs into {}", stored, urls.len(), partition);
        stored
    }
}
