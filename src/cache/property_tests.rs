//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify storage, expiry, classification and activation
//! invariants over generated inputs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use url::Url;

use crate::cache::{CacheStorage, CachedResponse, CacheVersion, PartitionKind};
use crate::config::Config;
use crate::network::StubFetcher;
use crate::policy::{Classifier, ResourceClass};
use crate::worker::Worker;

// == Strategies ==
/// Generates URL path segments
fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,16}".prop_map(|s| s)
}

/// Generates version tags like `v3`
fn version_strategy() -> impl Strategy<Value = String> {
    (0u8..6).prop_map(|n| format!("v{}", n))
}

fn url_for(path: &str) -> Url {
    Url::parse("http://localhost").unwrap().join(path).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* path ending in a static asset extension, outside /data/ and
    // /api/ prefixes, classification returns the static policy.
    #[test]
    fn prop_static_assets_classify_as_static(
        dirs in prop::collection::vec(segment_strategy(), 0..4),
        name in segment_strategy(),
        ext in prop::sample::select(vec!["css", "js", "mjs", "woff", "woff2", "ttf", "eot"]),
    ) {
        let classifier = Classifier::default();
        let mut path = String::new();
        for dir in &dirs {
            path.push('/');
            path.push_str(dir);
        }
        path.push_str(&format!("/{}.{}", name, ext));

        let policy = classifier.classify(&url_for(&path));
        prop_assert_eq!(policy.class, ResourceClass::Static, "path {}", path);
    }

    // *For any* stored date and max age, an entry is expired exactly when its
    // age reaches the max age.
    #[test]
    fn prop_expiry_matches_age(age_secs in 0i64..100_000, max_age_secs in 0u64..100_000) {
        let stored = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let response = CachedResponse::new(StatusCode::OK, "x").with_date(stored);
        let now = stored + chrono::Duration::seconds(age_secs);

        prop_assert_eq!(
            response.is_expired(Duration::from_secs(max_age_secs), now),
            age_secs as u64 >= max_age_secs
        );
    }

    // *For any* list of URLs written twice, the partition holds one entry per
    // distinct URL.
    #[test]
    fn prop_put_overwrites_instead_of_duplicating(
        paths in prop::collection::vec(segment_strategy(), 1..30),
    ) {
        let mut storage = CacheStorage::new(None);
        for _ in 0..2 {
            for path in &paths {
                storage
                    .put("dynamic-v1", &url_for(&format!("/{}", path)), CachedResponse::new(StatusCode::OK, path.clone()))
                    .unwrap();
            }
        }

        let distinct: HashSet<&String> = paths.iter().collect();
        prop_assert_eq!(storage.partition_stats("dynamic-v1").count, distinct.len());
        prop_assert_eq!(storage.stats().total_entries, distinct.len());
    }

    // *For any* sequence of writes, stored bytes never exceed the quota.
    #[test]
    fn prop_quota_is_never_exceeded(
        quota in 1usize..512,
        writes in prop::collection::vec((segment_strategy(), 0usize..128), 1..40),
    ) {
        let mut storage = CacheStorage::new(Some(quota));
        for (path, len) in writes {
            let _ = storage.put(
                "static-v1",
                &url_for(&format!("/{}", path)),
                CachedResponse::new(StatusCode::OK, "x".repeat(len)),
            );
            prop_assert!(storage.used_bytes() <= quota);
        }
    }

    // *For any* mix of partitions from several versions, activation leaves
    // only partitions of the current version.
    #[test]
    fn prop_activation_keeps_only_current_version(
        current in version_strategy(),
        existing in prop::collection::vec((version_strategy(), 0usize..4), 0..16),
    ) {
        let storage = CacheStorage::new(None).shared();
        let version = CacheVersion::new(current.clone());
        let config = Config {
            cache_version: current,
            precache_manifest: Vec::new(),
            ..Config::default()
        };
        let worker = Worker::new(config, storage.clone(), Arc::new(StubFetcher::new()));

        let expected: HashSet<String> = tokio_test::block_on(async {
            let mut guard = storage.write().await;
            for (tag, kind) in &existing {
                guard.open(&CacheVersion::new(tag.clone()).partition_name(PartitionKind::ALL[*kind]));
            }
            guard.keys().into_iter().filter(|name| version.owns(name)).collect()
        });

        tokio_test::block_on(async {
            worker.install().await.unwrap();
            worker.activate().await.unwrap();
        });

        let remaining: HashSet<String> =
            tokio_test::block_on(async { storage.read().await.keys() }).into_iter().collect();
        prop_assert_eq!(remaining, expected);
    }
}
