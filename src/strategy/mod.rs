//! Strategy Executor
//!
//! Runs one of the five caching strategies for a classified request against
//! the network and a cache partition.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::{CachedResponse, SharedStorage};
use crate::error::{Result, WorkerError};
use crate::network::{FetchRequest, Fetcher};
use crate::policy::{ResourcePolicy, Strategy};
use crate::tasks::Revalidator;

// == Strategy Executor ==
#[derive(Clone)]
pub struct StrategyExecutor {
    storage: SharedStorage,
    fetcher: Arc<dyn Fetcher>,
    revalidator: Revalidator,
}

impl StrategyExecutor {
    pub fn new(storage: SharedStorage, fetcher: Arc<dyn Fetcher>, revalidator: Revalidator) -> Self {
        Self {
            storage,
            fetcher,
            revalidator,
        }
    }

    /// Dispatches to the strategy named by `policy`.
    pub async fn execute(
        &self,
        request: &FetchRequest,
        partition: &str,
        policy: &ResourcePolicy,
    ) -> Result<CachedResponse> {
        debug!(
            "{} {} -> {} ({}) in {}",
            request.method, request.url, policy.strategy, policy.class, partition
        );

        match policy.strategy {
            Strategy::CacheFirst => self.cache_first(request, partition, policy).await,
            Strategy::NetworkFirst => self.network_first(request, partition, policy).await,
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(request, partition, policy).await
            }
            Strategy::NetworkOnly => self.network_only(request, partition, policy).await,
            Strategy::CacheOnly => self.cache_only(request, partition, policy).await,
        }
    }

    // == Cache First ==
    /// Serves a fresh cached entry, otherwise fetches and stores.
    ///
    /// Network errors propagate to the caller.
    pub async fn cache_first(
        &self,
        request: &FetchRequest,
        partition: &str,
        policy: &ResourcePolicy,
    ) -> Result<CachedResponse> {
        if let Some(cached) = self.lookup(partition, request).await {
            if !cached.is_expired(policy.max_age, Utc::now()) {
                return Ok(cached);
            }
            debug!("Cached {} expired, refetching", request.url);
        }

        let response = self.fetcher.fetch(request).await?;
        store(&self.storage, partition, request, &response).await;
        Ok(response)
    }

    // == Network First ==
    /// Fetches and stores, falling back to any cached entry regardless of age.
    pub async fn network_first(
        &self,
        request: &FetchRequest,
        partition: &str,
        _policy: &ResourcePolicy,
    ) -> Result<CachedResponse> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                store(&self.storage, partition, request, &response).await;
                Ok(response)
            }
            Err(e) => {
                debug!("Network failed for {}, trying cache: {}", request.url, e);
                self.lookup(partition, request).await.ok_or(e)
            }
        }
    }

    // == Stale While Revalidate ==
    /// Serves the cached entry immediately and refreshes it in the background.
    ///
    /// Without a cached entry the caller waits on the network instead.
    pub async fn stale_while_revalidate(
        &self,
        request: &FetchRequest,
        partition: &str,
        _policy: &ResourcePolicy,
    ) -> Result<CachedResponse> {
        match self.lookup(partition, request).await {
            Some(cached) => {
                self.revalidate(request, partition);
                Ok(cached)
            }
            None => {
                let response = self.fetcher.fetch(request).await?;
                store(&self.storage, partition, request, &response).await;
                Ok(response)
            }
        }
    }

    // == Network Only ==
    pub async fn network_only(
        &self,
        request: &FetchRequest,
        _partition: &str,
        _policy: &ResourcePolicy,
    ) -> Result<CachedResponse> {
        self.fetcher.fetch(request).await
    }

    // == Cache Only ==
    /// Serves the cached entry, or fails with `NotCached`.
    pub async fn cache_only(
        &self,
        request: &FetchRequest,
        partition: &str,
        _policy: &ResourcePolicy,
    ) -> Result<CachedResponse> {
        self.lookup(partition, request)
            .await
            .ok_or_else(|| WorkerError::NotCached(request.url.to_string()))
    }

    async fn lookup(&self, partition: &str, request: &FetchRequest) -> Option<CachedResponse> {
        let mut storage = self.storage.write().await;
        storage.match_in(partition, &request.url)
    }

    fn revalidate(&self, request: &FetchRequest, partition: &str) {
        let storage = self.storage.clone();
        let fetcher = self.fetcher.clone();
        let request = request.clone();
        let partition = partition.to_string();

        self.revalidator.spawn(request.url.to_string(), async move {
            let response = fetcher.fetch(&request).await?;
            store(&storage, &partition, &request, &response).await;
            Ok(())
        });
    }
}

/// Writes a clone of a successful response to the partition.
///
/// Rejected writes are logged and dropped; the caller keeps its response.
/// Returns true if the response was stored.
pub(crate) async fn store(
    storage: &SharedStorage,
    partition: &str,
    request: &FetchRequest,
    response: &CachedResponse,
) -> bool {
    if !response.is_success() {
        debug!(
            "Not caching {} with status {}",
            request.url,
            response.status.as_u16()
        );
        return false;
    }

    let mut storage = storage.write().await;
    match storage.put(partition, &request.url, response.clone()) {
        Ok(()) => true,
        Err(e) => {
            warn!("Dropped cache write for {}: {}", request.url, e);
            false
        }
    }
}
