//! Background Revalidation
//!
//! Tracks the stale-while-revalidate refreshes that run after a cached
//! response has already been returned.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;

/// Bounded set of in-flight background refreshes.
///
/// Each refresh holds one semaphore permit for its whole lifetime, so at most
/// `capacity` refreshes run at once. When every permit is taken, new refreshes
/// are skipped rather than queued.
#[derive(Debug, Clone)]
pub struct Revalidator {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl Revalidator {
    /// Creates a tracker allowing `capacity` concurrent refreshes.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Spawns `refresh` in the background if a slot is free.
    ///
    /// Returns the task handle, or None when the refresh was skipped. A failed
    /// refresh is logged and never surfaced to anyone.
    pub fn spawn<F>(&self, label: String, refresh: F) -> Option<JoinHandle<()>>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!("Revalidation of {} skipped: {} already running", label, self.capacity);
                return None;
            }
        };

        Some(tokio::spawn(async move {
            let _permit = permit;
            match refresh.await {
                Ok(()) => debug!("Revalidated {}", label),
                Err(e) => warn!("Background revalidation of {} failed: {}", label, e),
            }
        }))
    }

    /// Number of refreshes currently running.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Waits until every running refresh has finished.
    pub async fn wait_idle(&self) {
        if let Ok(all) = self.permits.acquire_many(self.capacity as u32).await {
            drop(all);
        }
    }
}
