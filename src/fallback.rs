//! Failure Handler
//!
//! Terminal fallback for requests the strategy executor could not satisfy.
//! Always produces a response.

use axum::http::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{CachedResponse, SharedStorage};
use crate::network::FetchRequest;

/// Body served to navigations when no offline page was cached.
pub const OFFLINE_HTML: &str = "<!DOCTYPE html>\
<html><head><meta charset=\"utf-8\"><title>Offline</title></head>\
<body><h1>You are offline</h1>\
<p>This page is not available offline. Check your connection and try again.</p>\
</body></html>";

/// Body served to other requests.
pub const OFFLINE_TEXT: &str = "Network error: resource unavailable offline";

// == Failure Handler ==
#[derive(Clone)]
pub struct FailureHandler {
    storage: SharedStorage,
    offline_page: Option<Url>,
}

impl FailureHandler {
    /// `offline_page` is the absolute URL of the cached offline document.
    pub fn new(storage: SharedStorage, offline_page: Option<Url>) -> Self {
        Self {
            storage,
            offline_page,
        }
    }

    /// Picks the best available response for a failed request: the copy in
    /// the request's own partition, then a copy in any partition, then the
    /// offline page for navigations, then a synthetic error.
    pub async fn recover(&self, request: &FetchRequest, partition: &str) -> CachedResponse {
        let mut storage = self.storage.write().await;

        if let Some(cached) = storage.match_in(partition, &request.url) {
            debug!("Recovered {} from {}", request.url, partition);
            return cached;
        }

        // Pre-warmed resources live in the static partition whatever their class
        if let Some(cached) = storage.match_any(&request.url) {
            debug!("Recovered {} from another partition", request.url);
            return cached;
        }

        if request.is_navigation() {
            if let Some(page) = self
                .offline_page
                .as_ref()
                .and_then(|url| storage.match_any(url))
            {
                debug!("Serving offline page for {}", request.url);
                return page;
            }
            warn!("No offline page cached, synthesizing one for {}", request.url);
            return offline_document();
        }

        warn!("Request for {} failed with no cached copy", request.url);
        offline_error()
    }
}

/// Minimal HTML notice for navigations.
pub fn offline_document() -> CachedResponse {
    CachedResponse::with_body(
        StatusCode::SERVICE_UNAVAILABLE,
        "text/html; charset=utf-8",
        OFFLINE_HTML,
    )
}

/// Plain-text `408` for everything else.
pub fn offline_error() -> CachedResponse {
    CachedResponse::with_body(
        StatusCode::REQUEST_TIMEOUT,
        "text/plain; charset=utf-8",
        OFFLINE_TEXT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStorage;
    use axum::http::header;

    fn url(path: &str) -> Url {
        Url::parse("http://localhost").unwrap().join(path).unwrap()
    }

    fn handler(storage: &SharedStorage) -> FailureHandler {
        FailureHandler::new(storage.clone(), Some(url("/offline.html")))
    }

    #[tokio::test]
    async fn test_prefers_cached_copy() {
        let storage = CacheStorage::new(None).shared();
        storage
            .write()
            .await
            .put("data-v1", &url("/data/a.json"), CachedResponse::new(StatusCode::OK, "[]"))
            .unwrap();

        let response = handler(&storage)
            .recover(&FetchRequest::get(url("/data/a.json")), "data-v1")
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "[]");
    }

    #[tokio::test]
    async fn test_falls_back_to_copy_in_other_partition() {
        let storage = CacheStorage::new(None).shared();
        storage
            .write()
            .await
            .put(
                "static-v1",
                &url("/manifest.json"),
                CachedResponse::with_body(StatusCode::OK, "application/json", "{}"),
            )
            .unwrap();

        let response = handler(&storage)
            .recover(&FetchRequest::get(url("/manifest.json")), "data-v1")
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "{}");
    }

    #[tokio::test]
    async fn test_navigation_gets_cached_offline_page() {
        let storage = CacheStorage::new(None).shared();
        storage
            .write()
            .await
            .put(
                "static-v1",
                &url("/offline.html"),
                CachedResponse::with_body(StatusCode::OK, "text/html", "<p>offline</p>"),
            )
            .unwrap();

        let response = handler(&storage)
            .recover(&FetchRequest::navigate(url("/guide")), "dynamic-v1")
            .await;

        assert_eq!(response.body, "<p>offline</p>");
    }

    #[tokio::test]
    async fn test_navigation_without_offline_page_gets_synthetic_html() {
        let storage = CacheStorage::new(None).shared();

        let response = handler(&storage)
            .recover(&FetchRequest::navigate(url("/guide")), "dynamic-v1")
            .await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(response
            .headers
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_subresource_gets_408() {
        let storage = CacheStorage::new(None).shared();

        let response = handler(&storage)
            .recover(&FetchRequest::get(url("/img/logo.png")), "images-v1")
            .await;

        assert_eq!(response.status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(response.body, OFFLINE_TEXT);
    }
}
