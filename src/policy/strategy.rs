//! Caching strategies a resource policy can select.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five caching algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Serve a fresh cached entry, else fetch and store
    CacheFirst,
    /// Fetch and store, else serve any cached entry
    NetworkFirst,
    /// Serve the cached entry now and refresh it in the background
    StaleWhileRevalidate,
    /// Always fetch, never touch the cache
    NetworkOnly,
    /// Only ever serve from the cache
    CacheOnly,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::NetworkOnly => "network-only",
            Strategy::CacheOnly => "cache-only",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names_match_display() {
        for strategy in [
            Strategy::CacheFirst,
            Strategy::NetworkFirst,
            Strategy::StaleWhileRevalidate,
            Strategy::NetworkOnly,
            Strategy::CacheOnly,
        ] {
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{}\"", strategy));
        }
    }
}
