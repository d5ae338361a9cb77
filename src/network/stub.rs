//! In-memory network used by tests and local demos.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use chrono::Utc;

use crate::cache::CachedResponse;
use crate::error::{Result, WorkerError};
use crate::network::{FetchRequest, Fetcher};

/// A scripted network.
///
/// Routes are keyed by absolute URL. Unknown URLs answer `404`. Every
/// response without a `date` header is stamped with the current time, the
/// way an origin server would. Calls are recorded so tests can assert on
/// network traffic.
#[derive(Debug, Default)]
#[doc(hidden)]
pub struct StubFetcher {
    routes: Mutex<HashMap<String, CachedResponse>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    latency: Mutex<Option<Duration>>,
    offline: AtomicBool,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `response` for `url`.
    pub fn route(&self, url: &str, response: CachedResponse) -> &Self {
        lock(&self.routes).insert(url.to_string(), response);
        self
    }

    /// Serves a `200` body with the given content type for `url`.
    pub fn route_text(&self, url: &str, content_type: &str, body: &str) -> &Self {
        self.route(
            url,
            CachedResponse::with_body(StatusCode::OK, content_type, body.to_string()),
        )
    }

    /// Makes every fetch of `url` fail with a network error.
    pub fn fail(&self, url: &str) -> &Self {
        lock(&self.failing).insert(url.to_string());
        self
    }

    /// Simulates loss of connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delays every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = Some(latency);
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        lock(&self.calls).iter().filter(|u| u.as_str() == url).count()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
        let url = request.url.to_string();
        lock(&self.calls).push(url.clone());

        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.offline.load(Ordering::SeqCst) || lock(&self.failing).contains(&url) {
            return Err(WorkerError::Network(format!("{} unreachable", url)));
        }

        let response = lock(&self.routes)
            .get(&url)
            .cloned()
            .unwrap_or_else(|| CachedResponse::with_body(StatusCode::NOT_FOUND, "text/plain", "not found"));

        if response.headers.contains_key(header::DATE) {
            Ok(response)
        } else {
            Ok(response.with_date(Utc::now()))
        }
    }
}
