//! Cache Partition Module
//!
//! A named map of GET request identities to stored responses.

use std::collections::BTreeMap;

use url::Url;

use crate::cache::CachedResponse;

/// Identity of a cached request. Only GET requests are ever stored.
fn request_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    format!("GET {}", url)
}

#[derive(Debug, Clone)]
struct PartitionEntry {
    url: String,
    response: CachedResponse,
}

// == Cache Partition ==
/// Contents of one named partition, e.g. `static-v2.1.0`.
#[derive(Debug, Clone, Default)]
pub struct CachePartition {
    entries: BTreeMap<String, PartitionEntry>,
}

impl CachePartition {
    /// Looks up the stored response for `url`.
    pub fn get(&self, url: &Url) -> Option<&CachedResponse> {
        self.entries.get(&request_key(url)).map(|e| &e.response)
    }

    /// Stores `response` for `url`, returning the entry it replaced.
    pub fn insert(&mut self, url: &Url, response: CachedResponse) -> Option<CachedResponse> {
        let mut url_string = url.clone();
        url_string.set_fragment(None);
        self.entries
            .insert(
                request_key(url),
                PartitionEntry {
                    url: url_string.to_string(),
                    response,
                },
            )
            .map(|old| old.response)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// URLs of every stored entry, in key order.
    pub fn urls(&self) -> Vec<String> {
        self.entries.values().map(|e| e.url.clone()).collect()
    }

    /// Sum of entry sizes in bytes.
    pub fn size_bytes(&self) -> usize {
        self.entries.values().map(|e| e.response.size()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut partition = CachePartition::default();
        partition.insert(
            &url("http://localhost/app.css"),
            CachedResponse::new(StatusCode::OK, "a{}"),
        );

        assert_eq!(partition.len(), 1);
        let stored = partition.get(&url("http://localhost/app.css")).unwrap();
        assert_eq!(stored.body, "a{}");
    }

    #[test]
    fn test_insert_overwrites() {
        let mut partition = CachePartition::default();
        let target = url("http://localhost/app.css");

        partition.insert(&target, CachedResponse::new(StatusCode::OK, "old"));
        let replaced = partition.insert(&target, CachedResponse::new(StatusCode::OK, "new"));

        assert_eq!(replaced.unwrap().body, "old");
        assert_eq!(partition.len(), 1);
        assert_eq!(partition.get(&target).unwrap().body, "new");
    }

    #[test]
    fn test_fragment_is_ignored() {
        let mut partition = CachePartition::default();
        partition.insert(
            &url("http://localhost/page#top"),
            CachedResponse::new(StatusCode::OK, "page"),
        );

        assert!(partition.get(&url("http://localhost/page")).is_some());
        assert_eq!(partition.urls(), vec!["http://localhost/page".to_string()]);
    }
}
