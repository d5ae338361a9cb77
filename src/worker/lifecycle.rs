//! Lifecycle Controller
//!
//! The worker context: install (pre-warm), activate (sweep old cache
//! versions, claim clients) and fetch interception.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheStorage, CacheVersion, CachedResponse, PartitionKind, SharedStorage};
use crate::config::Config;
use crate::error::{Result, WorkerError};
use crate::fallback::FailureHandler;
use crate::network::{FetchRequest, Fetcher, HttpFetcher};
use crate::policy::Classifier;
use crate::strategy::{store, StrategyExecutor};
use crate::tasks::Revalidator;
use crate::worker::WorkerState;

/// Outcome of the install pre-warm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallReport {
    /// Resources stored in the static partition
    pub cached: usize,
    /// Resources that could not be fetched or stored
    pub failed: Vec<String>,
}

// == Worker ==
/// One worker generation.
///
/// Constructed once per process and shared behind an `Arc` by every handler.
/// Several workers may share the same storage; only the active one should
/// receive fetches.
pub struct Worker {
    config: Config,
    version: CacheVersion,
    classifier: Classifier,
    storage: SharedStorage,
    fetcher: Arc<dyn Fetcher>,
    executor: StrategyExecutor,
    fallback: FailureHandler,
    revalidator: Revalidator,
    state: RwLock<WorkerState>,
    /// Serializes activation so the sweep finishes before clients are claimed
    activation: Mutex<()>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl Worker {
    // == Constructor ==
    /// Creates a worker in the `Installing` state.
    pub fn new(config: Config, storage: SharedStorage, fetcher: Arc<dyn Fetcher>) -> Self {
        let version = CacheVersion::new(config.cache_version.clone());
        let revalidator = Revalidator::new(config.max_revalidations);
        let executor = StrategyExecutor::new(storage.clone(), fetcher.clone(), revalidator.clone());
        let fallback = FailureHandler::new(storage.clone(), config.resolve(&config.offline_page));

        Self {
            version,
            classifier: Classifier::default(),
            storage,
            fetcher,
            executor,
            fallback,
            revalidator,
            state: RwLock::new(WorkerState::Installing),
            activation: Mutex::new(()),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
            config,
        }
    }

    /// Creates a worker with fresh storage and a real network client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = CacheStorage::new(config.storage_quota_bytes).shared();
        let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout())?);
        Ok(Self::new(config.clone(), storage, fetcher))
    }

    // == Accessors ==
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn revalidator(&self) -> &Revalidator {
        &self.revalidator
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// True once activation has claimed clients.
    pub fn controls_clients(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    // == Install ==
    /// Pre-warms the static partition from the manifest.
    ///
    /// Every resource is fetched on its own; a failure is logged and counted
    /// and the rest still install. Ends in `Waiting`, or activates right away
    /// if skip-waiting was requested.
    pub async fn install(&self) -> Result<InstallReport> {
        info!("Installing cache version {}", self.version);
        let partition = self.version.partition_name(PartitionKind::Static);
        let mut report = InstallReport::default();

        for path in &self.config.precache_manifest {
            match self.fetch_and_store(path, &partition).await {
                Ok(true) => report.cached += 1,
                Ok(false) => report.failed.push(path.clone()),
                Err(e) => {
                    warn!("Pre-warm of {} failed: {}", path, e);
                    report.failed.push(path.clone());
                }
            }
        }

        info!(
            "Installed {}: {} resources pre-warmed, {} failed",
            self.version,
            report.cached,
            report.failed.len()
        );

        *self.state.write().await = WorkerState::Waiting;

        if self.skip_waiting.load(Ordering::SeqCst) {
            self.activate().await?;
        }

        Ok(report)
    }

    // == Activate ==
    /// Deletes every partition outside the current version, then claims
    /// clients. Returns the names of the deleted partitions.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let _guard = self.activation.lock().await;

        match self.state().await {
            WorkerState::Active => return Ok(Vec::new()),
            WorkerState::Installing => {
                return Err(WorkerError::InvalidRequest(
                    "cannot activate before install completes".to_string(),
                ))
            }
            WorkerState::Redundant => {
                return Err(WorkerError::InvalidRequest(
                    "worker is redundant".to_string(),
                ))
            }
            WorkerState::Waiting => {}
        }

        let deleted: Vec<String> = {
            let mut storage = self.storage.write().await;
            let stale: Vec<String> = storage
                .keys()
                .into_iter()
                .filter(|name| !self.version.owns(name))
                .collect();
            for name in &stale {
                storage.delete(name);
            }
            stale
        };

        for name in &deleted {
            info!("Deleted old cache partition {}", name);
        }

        self.clients_claimed.store(true, Ordering::SeqCst);
        *self.state.write().await = WorkerState::Active;
        info!("Cache version {} active, clients claimed", self.version);

        Ok(deleted)
    }

    // == Skip Waiting ==
    /// Leaves `Waiting` immediately. During install, activation happens as
    /// soon as install finishes.
    pub async fn skip_waiting(&self) -> Result<()> {
        self.skip_waiting.store(true, Ordering::SeqCst);

        if self.state().await == WorkerState::Waiting {
            self.activate().await?;
        }
        Ok(())
    }

    // == Retire ==
    /// Moves the worker to `Redundant`; it stops intercepting fetches.
    pub async fn retire(&self) {
        self.clients_claimed.store(false, Ordering::SeqCst);
        *self.state.write().await = WorkerState::Redundant;
        info!("Worker for cache version {} is redundant", self.version);
    }

    // == Fetch ==
    /// Handles one request from a client.
    ///
    /// Non-GET and non-http(s) requests, and every request while this worker
    /// does not control clients, go straight to the network. Intercepted
    /// requests always produce a response.
    pub async fn handle_fetch(&self, request: FetchRequest) -> Result<CachedResponse> {
        if !request.is_interceptable() || !self.controls_clients() {
            debug!("Passing through {} {}", request.method, request.url);
            return self.fetcher.fetch(&request).await;
        }

        let policy = self.classifier.classify(&request.url);
        let partition = self.version.partition_name(policy.class.partition());

        match self.executor.execute(&request, &partition, policy).await {
            Ok(response) => Ok(response),
            Err(e) => {
                debug!("{} failed via {}: {}", request.url, policy.strategy, e);
                Ok(self.fallback.recover(&request, &partition).await)
            }
        }
    }

    /// Fetches `target` (path or absolute URL) and stores a successful
    /// response in `partition`. Returns whether it was stored.
    pub(crate) async fn fetch_and_store(&self, target: &str, partition: &str) -> Result<bool> {
        let url = self.resolve(target)?;
        let request = FetchRequest::get(url);
        let response = self.fetcher.fetch(&request).await?;

        if !response.is_success() {
            warn!(
                "{} answered {}, not cached",
                request.url,
                response.status.as_u16()
            );
            return Ok(false);
        }

        Ok(store(&self.storage, partition, &request, &response).await)
    }

    /// Resolves `target` against the upstream. Targets on any other origin
    /// are rejected.
    fn resolve(&self, target: &str) -> Result<Url> {
        let url = self
            .config
            .resolve(target)
            .ok_or_else(|| WorkerError::InvalidRequest(format!("invalid URL: {}", target)))?;

        if url.origin() != self.config.upstream_url.origin() {
            return Err(WorkerError::InvalidRequest(format!(
                "{} is outside the upstream origin",
                target
            )));
        }
        Ok(url)
    }
}
