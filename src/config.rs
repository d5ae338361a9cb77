//! Configuration Module
//!
//! Handles loading and managing worker configuration from environment variables.

use std::env;
use std::time::Duration;

use url::Url;

/// Default upstream origin the proxy fronts.
pub const DEFAULT_UPSTREAM: &str = "http://127.0.0.1:8080";

/// Critical resources pre-warmed into the static partition at install time.
pub const DEFAULT_PRECACHE: &[&str] = &[
    "/",
    "/index.html",
    "/css/styles.css",
    "/js/app.js",
    "/manifest.json",
    "/offline.html",
];

/// Worker configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Version tag scoping every cache partition name
    pub cache_version: String,
    /// Origin that intercepted requests are forwarded to
    pub upstream_url: Url,
    /// HTTP server port
    pub server_port: u16,
    /// Paths fetched and stored unconditionally at install time
    pub precache_manifest: Vec<String>,
    /// Path of the HTML page served to failed navigations
    pub offline_page: String,
    /// Upper bound on concurrent background revalidations
    pub max_revalidations: usize,
    /// Network request timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Storage quota in bytes, None = unlimited
    pub storage_quota_bytes: Option<usize>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_VERSION` - Cache version tag (default: v2.1.0)
    /// - `UPSTREAM_URL` - Upstream origin (default: http://127.0.0.1:8080)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `PRECACHE_URLS` - Comma-separated pre-warm manifest
    /// - `OFFLINE_PAGE` - Offline fallback page path (default: /offline.html)
    /// - `MAX_REVALIDATIONS` - Concurrent background refreshes (default: 8)
    /// - `FETCH_TIMEOUT_SECS` - Network timeout in seconds (default: 30)
    /// - `STORAGE_QUOTA_BYTES` - Storage quota, 0 disables it (default: 50 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache_version: env::var("CACHE_VERSION")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.cache_version),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.upstream_url),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            precache_manifest: env::var("PRECACHE_URLS")
                .ok()
                .map(|v| parse_manifest(&v))
                .unwrap_or(defaults.precache_manifest),
            offline_page: env::var("OFFLINE_PAGE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.offline_page),
            max_revalidations: env::var("MAX_REVALIDATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.max_revalidations),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout_secs),
            storage_quota_bytes: match env::var("STORAGE_QUOTA_BYTES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
            {
                Some(0) => None,
                Some(bytes) => Some(bytes),
                None => defaults.storage_quota_bytes,
            },
        }
    }

    /// Returns the network timeout as a Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Resolves a path or absolute URL against the upstream origin.
    pub fn resolve(&self, path: &str) -> Option<Url> {
        self.upstream_url.join(path).ok()
    }
}

/// Splits a comma-separated manifest, dropping blank items.
fn parse_manifest(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_version: "v2.1.0".to_string(),
            upstream_url: Url::parse(DEFAULT_UPSTREAM).expect("default upstream is a valid URL"),
            server_port: 3000,
            precache_manifest: DEFAULT_PRECACHE.iter().map(|p| p.to_string()).collect(),
            offline_page: "/offline.html".to_string(),
            max_revalidations: 8,
            fetch_timeout_secs: 30,
            storage_quota_bytes: Some(50 * 1024 * 1024),
        }
    }
}
