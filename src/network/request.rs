//! Intercepted request model.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use url::Url;

/// How the request was issued by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    /// Subresource, XHR or anything else
    Other,
}

// == Fetch Request ==
/// A single request flowing through the worker.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    /// Absolute request URL
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub mode: RequestMode,
}

impl FetchRequest {
    /// A plain subresource GET.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            mode: RequestMode::Other,
        }
    }

    /// A page navigation GET.
    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Only GET requests over http(s) are handled by the cache layer.
    pub fn is_interceptable(&self) -> bool {
        self.method == Method::GET && matches!(self.url.scheme(), "http" | "https")
    }
}
