//! Network Module
//!
//! The fetch-capable client the worker depends on.
//!
//! # Implementations
//! - `HttpFetcher` - real network via reqwest
//! - `StubFetcher` - scripted in-memory network for tests, hidden from docs

mod http;
mod request;
mod stub;

use async_trait::async_trait;

use crate::cache::CachedResponse;
use crate::error::Result;

pub use http::HttpFetcher;
pub use request::{FetchRequest, RequestMode};
#[doc(hidden)]
pub use stub::StubFetcher;

/// Issues a request over the network.
///
/// Any HTTP status is a successful fetch; only transport failures
/// (connectivity, DNS, timeout) are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse>;
}
