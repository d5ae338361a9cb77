//! reqwest-backed network client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use reqwest::Client;
use tracing::debug;

use crate::cache::CachedResponse;
use crate::error::{Result, WorkerError};
use crate::network::{FetchRequest, Fetcher};

/// Fetches over the real network.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

/// Drops headers that describe the client connection rather than the request.
fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in [
        header::HOST,
        header::CONNECTION,
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ] {
        forwarded.remove(name);
    }
    forwarded
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
        let start = Instant::now();

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(forwarded_headers(&request.headers))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| WorkerError::Network(format!("{} {}: {}", request.method, request.url, e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| WorkerError::Network(format!("failed to read {}: {}", request.url, e)))?;

        debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(CachedResponse {
            status,
            headers,
            body,
        })
    }
}
